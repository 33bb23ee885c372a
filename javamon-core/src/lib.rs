#![cfg_attr(not(test), no_std)]

mod monitor;
mod poll;
mod report;

pub use monitor::{Activity, Config, Monitor, FORCED_REPORT_POLLS, POLL_INTERVAL_TICKS, SCALE_ADDRESS};
pub use poll::{Poll, PollTimer};
pub use report::{payload, scale_value, Payload, PayloadError, Reporter, READ_ERROR};
