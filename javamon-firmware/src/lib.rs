#![no_std]

use embassy_rp::gpio::{Flex, Pull};
use twi_master::{Level, LineCommand, LineCommands, LineLevels};

/// Put a pin into the released bus state: input, with the weak internal
/// pull-up as a fallback for benches without the external resistors.
pub fn init_bus_pin(pin: &mut Flex<'_>) {
    pin.set_pull(Pull::Up);
    pin.set_as_input();
}

pub fn sample(scl: &mut Flex<'_>, sda: &mut Flex<'_>) -> LineLevels {
    LineLevels::new(Level::from(scl.is_high()), Level::from(sda.is_high()))
}

/// Clock is applied before data; data may only cross a high clock at the
/// start and stop edges.
pub fn apply(commands: LineCommands, scl: &mut Flex<'_>, sda: &mut Flex<'_>) {
    apply_line(commands.scl, scl);
    apply_line(commands.sda, sda);
}

fn apply_line(command: Option<LineCommand>, pin: &mut Flex<'_>) {
    match command {
        Some(LineCommand::Release) => pin.set_as_input(),
        Some(LineCommand::DriveLow) => {
            // Output register low before the direction flip, so the pin
            // never drives high.
            pin.set_low();
            pin.set_as_output();
        }
        None => {}
    }
}
