use crate::line::{Level, LineCommand, LineCommands, LineLevels};

/// Scripted two-byte slave for bus-level tests. Reacts to clock edges the
/// way the scale does: acknowledge the address, serve two bytes, release
/// the line for the master's answer slots.
pub struct MockSlave {
    data: [u8; 2],
    ack_address: bool,
    prev: LineLevels,
    rises: u32,
    falls: u32,
    in_transaction: bool,
    drive_sda_low: bool,
    shift: u8,
    pub captured_address: Option<u8>,
    /// Master's answer after each served byte, true when acknowledged.
    pub master_acks: [Option<bool>; 2],
    pub stop_count: u32,
}

impl MockSlave {
    pub fn new(data: [u8; 2]) -> Self {
        Self {
            data,
            ack_address: true,
            prev: LineLevels::new(Level::High, Level::High),
            rises: 0,
            falls: 0,
            in_transaction: false,
            drive_sda_low: false,
            shift: 0,
            captured_address: None,
            master_acks: [None; 2],
            stop_count: 0,
        }
    }

    /// Never acknowledge or drive anything, like an absent device.
    pub fn refuse_address(mut self) -> Self {
        self.ack_address = false;
        self
    }

    /// Change what the next transaction reads.
    pub fn set_data(&mut self, data: [u8; 2]) {
        self.data = data;
    }

    fn wire(&mut self, levels: LineLevels) {
        let scl_rose = self.prev.scl.is_low() && levels.scl.is_high();
        let scl_fell = self.prev.scl.is_high() && levels.scl.is_low();

        if self.prev.scl.is_high() && levels.scl.is_high() {
            if self.prev.sda.is_high() && levels.sda.is_low() {
                // Start condition. A repeated start resets the counts too.
                self.in_transaction = true;
                self.rises = 0;
                self.falls = 0;
                self.shift = 0;
                self.drive_sda_low = false;
            } else if self.prev.sda.is_low() && levels.sda.is_high() {
                self.stop_count += 1;
                self.in_transaction = false;
                self.drive_sda_low = false;
            }
        }

        if self.in_transaction && scl_rose {
            self.rises += 1;
            match self.rises {
                1..=8 => {
                    self.shift = (self.shift << 1) | levels.sda.is_high() as u8;
                    if self.rises == 8 {
                        self.captured_address = Some(self.shift);
                    }
                }
                18 => self.master_acks[0] = Some(levels.sda.is_low()),
                27 => self.master_acks[1] = Some(levels.sda.is_low()),
                _ => {}
            }
        }

        if self.in_transaction && scl_fell {
            self.falls += 1;
            if self.ack_address {
                match self.falls {
                    9 => self.drive_sda_low = true,
                    10..=17 => {
                        self.drive_sda_low = (self.data[0] >> (17 - self.falls)) & 1 == 0;
                    }
                    18 => self.drive_sda_low = false,
                    19..=26 => {
                        self.drive_sda_low = (self.data[1] >> (26 - self.falls)) & 1 == 0;
                    }
                    27 => self.drive_sda_low = false,
                    _ => {}
                }
            }
        }

        self.prev = levels;
    }
}

/// Wired-AND of the master's commands, the slave's drives and an optional
/// external jam. Lines read high only when nobody holds them down.
pub struct BusSim {
    pub slave: MockSlave,
    scl_driven_low: bool,
    sda_driven_low: bool,
    sda_jammed: bool,
}

impl BusSim {
    pub fn new(slave: MockSlave) -> Self {
        Self {
            slave,
            scl_driven_low: false,
            sda_driven_low: false,
            sda_jammed: false,
        }
    }

    /// Hold SDA low from outside, like a wedged peer.
    pub fn jam_sda(&mut self) {
        self.sda_jammed = true;
    }

    pub fn clear_sda_jam(&mut self) {
        self.sda_jammed = false;
    }

    pub fn levels(&self) -> LineLevels {
        let scl = !self.scl_driven_low;
        let sda = !(self.sda_driven_low || self.slave.drive_sda_low || self.sda_jammed);
        LineLevels::new(scl.into(), sda.into())
    }

    // Clock applied before data, so data edges under a high clock are
    // exactly the start and stop conditions.
    pub fn apply(&mut self, commands: LineCommands) {
        if let Some(command) = commands.scl {
            self.scl_driven_low = matches!(command, LineCommand::DriveLow);
            let levels = self.levels();
            self.slave.wire(levels);
        }
        if let Some(command) = commands.sda {
            self.sda_driven_low = matches!(command, LineCommand::DriveLow);
            let levels = self.levels();
            self.slave.wire(levels);
        }
    }
}
