#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Line {
    Scl,
    Sda,
}

/// Sampled line state for one tick. A released line reads high only
/// because the external pull-ups hold it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct LineLevels {
    pub scl: Level,
    pub sda: Level,
}

impl LineLevels {
    pub const fn new(scl: Level, sda: Level) -> Self {
        Self { scl, sda }
    }

    pub const fn level(&self, line: Line) -> Level {
        match line {
            Line::Scl => self.scl,
            Line::Sda => self.sda,
        }
    }
}

// Open drain: a line is either released to the pull-ups or held low.
// There is no drive-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LineCommand {
    Release,
    DriveLow,
}

/// Pin actions for one tick. `None` leaves the line as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct LineCommands {
    pub scl: Option<LineCommand>,
    pub sda: Option<LineCommand>,
}

impl LineCommands {
    pub const fn none() -> Self {
        Self {
            scl: None,
            sda: None,
        }
    }

    pub fn release(&mut self, line: Line) {
        self.set(line, LineCommand::Release);
    }

    pub fn drive_low(&mut self, line: Line) {
        self.set(line, LineCommand::DriveLow);
    }

    pub const fn get(&self, line: Line) -> Option<LineCommand> {
        match line {
            Line::Scl => self.scl,
            Line::Sda => self.sda,
        }
    }

    fn set(&mut self, line: Line, command: LineCommand) {
        match line {
            Line::Scl => self.scl = Some(command),
            Line::Sda => self.sda = Some(command),
        }
    }
}
