#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::gpio::Flex;
use embassy_time::{Duration, Ticker};
use javamon_firmware::{init_bus_pin, sample};
use {defmt_rtt as _, panic_probe as _};

const LOOP_DURATION: Duration = Duration::from_millis(500);

// Bring-up check: with the scale attached and pull-ups in place, both
// lines must read high while the bus is quiet.
#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let mut scl = Flex::new(p.PIN_2);
    let mut sda = Flex::new(p.PIN_0);
    init_bus_pin(&mut scl);
    init_bus_pin(&mut sda);

    let mut ticker = Ticker::every(LOOP_DURATION);
    loop {
        let levels = sample(&mut scl, &mut sda);
        defmt::println!("scl {} sda {}", levels.scl, levels.sda);
        ticker.next().await;
    }
}
