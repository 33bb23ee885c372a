use core::fmt::Write;

use thiserror::Error;

/// Published instead of a weight when a read returns out-of-range bytes.
pub const READ_ERROR: u16 = 10_000;

pub const PAYLOAD_CAPACITY: usize = 40;

pub type Payload = heapless::String<PAYLOAD_CAPACITY>;

/// Folds the two raw scale bytes into one value: hundreds from the first
/// byte, the second byte rounded to whole tens. Readings with either byte
/// above 99 come back as [`READ_ERROR`], and a first byte of zero with a
/// small second byte clamps to zero outright.
pub const fn scale_value(raw: [u8; 2]) -> u16 {
    let [hundreds, units] = raw;
    if hundreds > 99 || units > 99 {
        return READ_ERROR;
    }
    if hundreds == 0 && units < 50 {
        return 0;
    }
    hundreds as u16 * 100 + round_to_ten(units)
}

const fn round_to_ten(value: u8) -> u16 {
    let tens = (value / 10) as u16;
    if value % 10 > 4 {
        (tens + 1) * 10
    } else {
        tens * 10
    }
}

/// Decides which readings are worth publishing: changes always, plus
/// whatever was explicitly forced.
#[derive(Debug, Default)]
pub struct Reporter {
    last_reported: u16,
    forced: bool,
    reset_requested: bool,
}

impl Reporter {
    pub const fn new() -> Self {
        Self {
            last_reported: 0,
            forced: false,
            reset_requested: false,
        }
    }

    /// Report the next completed read no matter what it says.
    pub fn force_next(&mut self) {
        self.forced = true;
    }

    /// Degraded mode. Every transaction from here on addresses the scale
    /// for a write, which its firmware takes as a reset. There is no way
    /// back; only a power cycle clears it.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    pub const fn reset_requested(&self) -> bool {
        self.reset_requested
    }

    pub fn process(&mut self, raw: [u8; 2]) -> Option<u16> {
        let value = scale_value(raw);
        if value != self.last_reported || self.forced {
            self.last_reported = value;
            self.forced = false;
            Some(value)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload does not fit the send buffer")]
    TooLong,
}

pub fn payload(value: u16) -> Result<Payload, PayloadError> {
    let mut buffer = Payload::new();
    write!(buffer, "{{\"columns\":[[\"Coffee\",\"{value}\"]]}}")
        .map_err(|_| PayloadError::TooLong)?;
    Ok(buffer)
}
