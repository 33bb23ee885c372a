use crate::line::{Line, LineCommands, LineLevels};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
}

impl Access {
    const fn bit(self) -> u8 {
        match self {
            Access::Read => 1,
            Access::Write => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BusEvent {
    /// A transaction finished; both data bytes in bus order.
    Complete([u8; 2]),
    /// The start retry limit ran out while the bus stayed busy.
    StartAbandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TickOutput {
    pub commands: LineCommands,
    pub event: Option<BusEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Start { started: bool },
    AddressOrData,
    Ack,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Transmitting,
    Receiving,
}

/// Run-to-completion bus master. Call [`TwiMaster::tick`] at a fixed rate
/// with the sampled line levels; apply the returned commands to the pins,
/// clock line first. One bit takes two ticks.
#[derive(Debug)]
pub struct TwiMaster {
    slave_address: u8,
    start_retry_limit: Option<u32>,
    phase: Phase,
    direction: Direction,
    scl_is_low: bool,
    shift: u8,
    bit_count: u8,
    received: [u8; 2],
    first_byte_expected: bool,
    transmit_requested: bool,
    access: Access,
    start_retries: u32,
}

impl TwiMaster {
    pub const fn new(slave_address: u8) -> Self {
        Self {
            slave_address,
            start_retry_limit: None,
            phase: Phase::Idle,
            direction: Direction::Transmitting,
            scl_is_low: false,
            shift: 0,
            bit_count: 0,
            received: [0; 2],
            first_byte_expected: false,
            transmit_requested: false,
            access: Access::Read,
            start_retries: 0,
        }
    }

    /// Abandon a start attempt after the bus has been busy for this many
    /// ticks. Without a limit the master retries until the bus clears.
    pub const fn with_start_retry_limit(mut self, ticks: u32) -> Self {
        self.start_retry_limit = Some(ticks);
        self
    }

    /// Latch a transaction request. Picked up on the next tick in idle;
    /// a request made mid-transaction starts right after the current one.
    pub fn request(&mut self, access: Access) {
        self.transmit_requested = true;
        self.access = access;
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle) && !self.transmit_requested
    }

    pub fn tick(&mut self, lines: LineLevels) -> TickOutput {
        let mut out = TickOutput {
            commands: LineCommands::none(),
            event: None,
        };
        match self.phase {
            Phase::Idle => {
                // The request flag stays set until the address byte is
                // answered; requests landing before that are absorbed by
                // the transaction already under way.
                if self.transmit_requested {
                    self.first_byte_expected = true;
                    self.start_retries = 0;
                    self.phase = Phase::Start { started: false };
                    self.start(false, lines, &mut out);
                }
            }
            Phase::Start { started } => self.start(started, lines, &mut out),
            Phase::AddressOrData => self.transfer_bit(lines, &mut out),
            Phase::Ack => self.handshake(lines, &mut out),
            Phase::Stop => self.stop(&mut out),
        }
        out
    }

    fn start(&mut self, started: bool, lines: LineLevels, out: &mut TickOutput) {
        if !started {
            if lines.scl.is_high() && lines.sda.is_high() {
                // Quiet bus. Dropping SDA under a high clock is the
                // start condition.
                out.commands.drive_low(Line::Sda);
                self.phase = Phase::Start { started: true };
            } else {
                // Keep our side off the bus while waiting it out.
                out.commands.release(Line::Scl);
                out.commands.release(Line::Sda);
                self.start_retries = self.start_retries.saturating_add(1);
                if self
                    .start_retry_limit
                    .is_some_and(|limit| self.start_retries >= limit)
                {
                    self.transmit_requested = false;
                    self.first_byte_expected = false;
                    self.phase = Phase::Idle;
                    out.event = Some(BusEvent::StartAbandoned);
                }
            }
            return;
        }
        self.shift = (self.slave_address << 1) | self.access.bit();
        self.bit_count = 8;
        self.direction = Direction::Transmitting;
        out.commands.drive_low(Line::Scl);
        self.output_bit(out);
        self.scl_is_low = true;
        self.phase = Phase::AddressOrData;
    }

    fn transfer_bit(&mut self, lines: LineLevels, out: &mut TickOutput) {
        if self.scl_is_low {
            // The data bit settled during the low half; expose it.
            out.commands.release(Line::Scl);
            self.scl_is_low = false;
            return;
        }
        if let Direction::Receiving = self.direction {
            self.shift = (self.shift << 1) | lines.sda.is_high() as u8;
        }
        self.bit_count -= 1;
        if self.bit_count == 0 {
            out.commands.drive_low(Line::Scl);
            match self.direction {
                // Let the peer answer the byte we sent.
                Direction::Transmitting => out.commands.release(Line::Sda),
                Direction::Receiving => {
                    if self.first_byte_expected {
                        out.commands.drive_low(Line::Sda);
                    } else {
                        // Last byte: leave the answer slot high.
                        out.commands.release(Line::Sda);
                    }
                }
            }
            self.scl_is_low = true;
            self.phase = Phase::Ack;
        } else {
            out.commands.drive_low(Line::Scl);
            if let Direction::Transmitting = self.direction {
                self.output_bit(out);
            }
            self.scl_is_low = true;
        }
    }

    fn handshake(&mut self, lines: LineLevels, out: &mut TickOutput) {
        if self.scl_is_low {
            out.commands.release(Line::Scl);
            self.scl_is_low = false;
            return;
        }
        match self.direction {
            Direction::Transmitting => {
                // The peer's answer to the address byte is kept but
                // nothing acts on it.
                self.shift = (self.shift << 1) | lines.sda.is_high() as u8;
                // The address made it out, so the request is served.
                self.transmit_requested = false;
                self.direction = Direction::Receiving;
                self.begin_receive_byte(out);
            }
            Direction::Receiving => {
                if self.first_byte_expected {
                    self.received[0] = self.shift;
                    self.first_byte_expected = false;
                    self.begin_receive_byte(out);
                } else {
                    self.received[1] = self.shift;
                    // Park both lines low so the stop edge can rise.
                    out.commands.drive_low(Line::Scl);
                    out.commands.drive_low(Line::Sda);
                    self.scl_is_low = true;
                    self.phase = Phase::Stop;
                }
            }
        }
    }

    fn stop(&mut self, out: &mut TickOutput) {
        if self.scl_is_low {
            out.commands.release(Line::Scl);
            self.scl_is_low = false;
            return;
        }
        // SDA rising under a high clock is the stop condition.
        out.commands.release(Line::Sda);
        self.phase = Phase::Idle;
        out.event = Some(BusEvent::Complete(self.received));
    }

    fn output_bit(&mut self, out: &mut TickOutput) {
        if self.shift & 0x80 != 0 {
            out.commands.release(Line::Sda);
        } else {
            out.commands.drive_low(Line::Sda);
        }
        self.shift <<= 1;
    }

    fn begin_receive_byte(&mut self, out: &mut TickOutput) {
        out.commands.drive_low(Line::Scl);
        out.commands.release(Line::Sda);
        self.shift = 0;
        self.bit_count = 8;
        self.scl_is_low = true;
        self.phase = Phase::AddressOrData;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::line::LineCommand;
    use crate::mock::{BusSim, MockSlave};
    use test_case::test_case;

    fn run_to_event(master: &mut TwiMaster, sim: &mut BusSim, max_ticks: u32) -> (BusEvent, u32) {
        for n in 1..=max_ticks {
            let out = master.tick(sim.levels());
            sim.apply(out.commands);
            if let Some(event) = out.event {
                return (event, n);
            }
        }
        panic!("no event within {max_ticks} ticks");
    }

    #[test]
    fn stays_idle_without_request() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([1, 2]));
        for _ in 0..100 {
            let out = master.tick(sim.levels());
            assert_eq!(out.commands, LineCommands::none());
            assert_eq!(out.event, None);
            sim.apply(out.commands);
        }
        assert!(master.is_idle());
    }

    #[test]
    fn first_tick_after_request_drops_sda() {
        let mut master = TwiMaster::new(0x26);
        let sim = BusSim::new(MockSlave::new([0, 0]));
        master.request(Access::Read);
        assert!(!master.is_idle());
        let out = master.tick(sim.levels());
        assert_eq!(out.commands.sda, Some(LineCommand::DriveLow));
        assert_eq!(out.commands.scl, None);
    }

    #[test_case(0x26, Access::Read => 0x4D)]
    #[test_case(0x26, Access::Write => 0x4C)]
    #[test_case(0x59, Access::Write => 0xB2)]
    #[test_case(0x59, Access::Read => 0xB3)]
    #[test_case(0x7F, Access::Write => 0xFE)]
    fn shifts_address_byte_out_msb_first(address: u8, access: Access) -> u8 {
        let mut master = TwiMaster::new(address);
        let mut sim = BusSim::new(MockSlave::new([0, 0]));
        master.request(access);
        run_to_event(&mut master, &mut sim, 200);
        sim.slave.captured_address.unwrap()
    }

    #[test]
    fn reads_both_bytes_from_cooperating_slave() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([7, 43]));
        master.request(Access::Read);
        let (event, ticks) = run_to_event(&mut master, &mut sim, 200);
        assert_eq!(event, BusEvent::Complete([7, 43]));
        // Start edge, 27 clocks at two ticks each, stop setup and edge.
        assert_eq!(ticks, 58);
        assert!(master.is_idle());
        assert_eq!(sim.slave.captured_address, Some(0x4D));
        assert_eq!(sim.slave.master_acks, [Some(true), Some(false)]);
        assert_eq!(sim.slave.stop_count, 1);
    }

    #[test]
    fn sda_moves_under_high_clock_only_at_start_and_stop() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([0xA5, 0x5A]));
        master.request(Access::Read);
        let mut previous = sim.levels();
        let mut transitions = 0;
        for _ in 0..200 {
            let out = master.tick(sim.levels());
            sim.apply(out.commands);
            let now = sim.levels();
            if now.scl.is_high() && previous.scl.is_high() && now.sda != previous.sda {
                transitions += 1;
            }
            previous = now;
            if out.event.is_some() {
                break;
            }
        }
        assert_eq!(transitions, 2);
    }

    #[test]
    fn refused_address_still_clocks_two_bytes() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([7, 43]).refuse_address());
        master.request(Access::Read);
        let (event, _) = run_to_event(&mut master, &mut sim, 200);
        // Nobody drives the data line, so the reads come back all ones.
        assert_eq!(event, BusEvent::Complete([0xFF, 0xFF]));
        assert_eq!(sim.slave.stop_count, 1);
    }

    #[test]
    fn retries_start_while_bus_is_jammed() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([0, 0]));
        sim.jam_sda();
        master.request(Access::Read);
        let mut released = LineCommands::none();
        released.release(Line::Scl);
        released.release(Line::Sda);
        for _ in 0..10_000 {
            let out = master.tick(sim.levels());
            assert_eq!(out.event, None);
            assert_eq!(out.commands, released);
            sim.apply(out.commands);
        }
        assert!(!master.is_idle());

        // However long the jam lasted, the attempt still goes through.
        sim.clear_sda_jam();
        let (event, _) = run_to_event(&mut master, &mut sim, 200);
        assert_eq!(event, BusEvent::Complete([0, 0]));
    }

    #[test]
    fn abandons_start_when_limit_runs_out() {
        let mut master = TwiMaster::new(0x26).with_start_retry_limit(5);
        let mut sim = BusSim::new(MockSlave::new([0, 0]));
        sim.jam_sda();
        master.request(Access::Read);
        let (event, ticks) = run_to_event(&mut master, &mut sim, 200);
        assert_eq!(event, BusEvent::StartAbandoned);
        assert_eq!(ticks, 5);
        assert!(master.is_idle());

        // A fresh request succeeds once the bus clears.
        sim.clear_sda_jam();
        master.request(Access::Read);
        let (event, _) = run_to_event(&mut master, &mut sim, 200);
        assert_eq!(event, BusEvent::Complete([0, 0]));
    }

    #[test]
    fn back_to_back_transactions() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([3, 21]));
        master.request(Access::Read);
        let (first, _) = run_to_event(&mut master, &mut sim, 200);
        master.request(Access::Read);
        let (second, _) = run_to_event(&mut master, &mut sim, 200);
        assert_eq!(first, second);
        assert_eq!(sim.slave.stop_count, 2);
    }

    #[test]
    fn request_during_transaction_queues_next_one() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([3, 21]));
        master.request(Access::Read);
        let mut events = 0;
        for n in 0..200 {
            if n == 20 {
                master.request(Access::Read);
            }
            let out = master.tick(sim.levels());
            sim.apply(out.commands);
            if let Some(BusEvent::Complete(bytes)) = out.event {
                assert_eq!(bytes, [3, 21]);
                events += 1;
            }
        }
        assert_eq!(events, 2);
        assert_eq!(sim.slave.stop_count, 2);
    }

    #[test]
    fn request_before_the_address_answer_is_absorbed() {
        let mut master = TwiMaster::new(0x26);
        let mut sim = BusSim::new(MockSlave::new([3, 21]));
        master.request(Access::Read);
        let mut events = 0;
        for n in 0..200 {
            // Lands while the address byte is still on the wire.
            if n == 5 {
                master.request(Access::Read);
            }
            let out = master.tick(sim.levels());
            sim.apply(out.commands);
            if out.event.is_some() {
                events += 1;
            }
        }
        assert_eq!(events, 1);
        assert_eq!(sim.slave.stop_count, 1);
        assert!(master.is_idle());
    }
}
