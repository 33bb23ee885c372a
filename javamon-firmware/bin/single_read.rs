#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::gpio::Flex;
use embassy_time::{Duration, Ticker, Timer};
use javamon_core::{scale_value, SCALE_ADDRESS};
use javamon_firmware::{apply, init_bus_pin, sample};
use twi_master::{Access, BusEvent, TwiMaster};
use {defmt_rtt as _, panic_probe as _};

const TICK: Duration = Duration::from_millis(1);

// Reads the scale once every two seconds and prints the raw bytes next to
// the filtered value.
#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let mut scl = Flex::new(p.PIN_2);
    let mut sda = Flex::new(p.PIN_0);
    init_bus_pin(&mut scl);
    init_bus_pin(&mut sda);

    let mut master = TwiMaster::new(SCALE_ADDRESS).with_start_retry_limit(1_000);
    let mut ticker = Ticker::every(TICK);
    loop {
        master.request(Access::Read);
        let raw = loop {
            let output = master.tick(sample(&mut scl, &mut sda));
            apply(output.commands, &mut scl, &mut sda);
            match output.event {
                Some(BusEvent::Complete(raw)) => break Some(raw),
                Some(BusEvent::StartAbandoned) => break None,
                None => {}
            }
            ticker.next().await;
        };
        match raw {
            Some(raw) => defmt::println!(
                "raw {=u8} {=u8}, value {=u16}",
                raw[0],
                raw[1],
                scale_value(raw)
            ),
            None => defmt::warn!("bus stayed busy, nothing read"),
        }
        Timer::after_secs(2).await;
    }
}
