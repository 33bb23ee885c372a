#![cfg_attr(not(test), no_std)]

mod line;
mod master;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use line::{Level, Line, LineCommand, LineCommands, LineLevels};
pub use master::{Access, BusEvent, TickOutput, TwiMaster};
