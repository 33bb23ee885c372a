use twi_master::{Access, BusEvent, LineCommands, LineLevels, TwiMaster};

use crate::poll::PollTimer;
use crate::report::Reporter;

pub const SCALE_ADDRESS: u8 = 0x26;
/// Scale poll cadence in ticks, one read every five seconds at a 1 ms tick.
pub const POLL_INTERVAL_TICKS: u32 = 5_000;
/// Every sixtieth poll reports even when nothing changed.
pub const FORCED_REPORT_POLLS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    pub slave_address: u8,
    pub poll_interval: u32,
    pub force_every: u32,
    pub start_retry_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slave_address: SCALE_ADDRESS,
            poll_interval: POLL_INTERVAL_TICKS,
            force_every: FORCED_REPORT_POLLS,
            start_retry_limit: None,
        }
    }
}

/// What one tick produced: pin work now, and possibly a value to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub commands: LineCommands,
    pub report: Option<u16>,
    pub bus_abandoned: bool,
}

/// Ties the poll timer, the bus master and the reporter together. Drive it
/// once per tick with the sampled lines and apply the returned commands.
pub struct Monitor {
    master: TwiMaster,
    timer: PollTimer,
    reporter: Reporter,
}

impl Monitor {
    pub fn new(config: Config) -> Self {
        let master = match config.start_retry_limit {
            Some(ticks) => TwiMaster::new(config.slave_address).with_start_retry_limit(ticks),
            None => TwiMaster::new(config.slave_address),
        };
        Self {
            master,
            timer: PollTimer::new(config.poll_interval, config.force_every),
            reporter: Reporter::new(),
        }
    }

    /// The session is up; the next completed read reports unconditionally.
    pub fn connected(&mut self) {
        self.reporter.force_next();
    }

    /// The session failed. Falls into degraded mode for good: every later
    /// poll addresses the scale for a write, asking it to reset.
    pub fn connection_error(&mut self) {
        self.reporter.request_reset();
    }

    pub fn tick(&mut self, lines: LineLevels) -> Activity {
        if let Some(poll) = self.timer.tick() {
            if poll.force_report {
                self.reporter.force_next();
            }
            let access = if self.reporter.reset_requested() {
                Access::Write
            } else {
                Access::Read
            };
            self.master.request(access);
        }
        let output = self.master.tick(lines);
        let mut activity = Activity {
            commands: output.commands,
            report: None,
            bus_abandoned: false,
        };
        match output.event {
            Some(BusEvent::Complete(raw)) => activity.report = self.reporter.process(raw),
            Some(BusEvent::StartAbandoned) => activity.bus_abandoned = true,
            None => {}
        }
        activity
    }
}
