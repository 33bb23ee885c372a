#![no_std]
#![no_main]

use defmt::{info, trace, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Flex;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use javamon_core::{payload, Config, Monitor};
use javamon_firmware::{apply, init_bus_pin, sample};
use {defmt_rtt as _, panic_probe as _};

const TICK: Duration = Duration::from_millis(1);
const PUBLISH_CHANNEL: &str = "javamon";

#[derive(Debug, Clone, Copy)]
enum SessionEvent {
    Up,
    Error,
}

static REPORTS: Channel<ThreadModeRawMutex, u16, 4> = Channel::new();
static SESSION: Signal<ThreadModeRawMutex, SessionEvent> = Signal::new();

#[embassy_executor::task]
async fn publish() {
    loop {
        let value = REPORTS.receive().await;
        match payload(value) {
            Ok(message) => info!("publish {=str}: {=str}", PUBLISH_CHANNEL, message.as_str()),
            Err(_) => warn!("value {=u16} does not fit the payload buffer", value),
        }
    }
}

// Stand-in for the network client. A real one establishes the session,
// signals Up, and raises Error when publishing fails.
#[embassy_executor::task]
async fn session() {
    Timer::after_secs(1).await;
    SESSION.signal(SessionEvent::Up);
}

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    info!("Start");
    let p = embassy_rp::init(Default::default());

    let mut scl = Flex::new(p.PIN_2);
    let mut sda = Flex::new(p.PIN_0);
    init_bus_pin(&mut scl);
    init_bus_pin(&mut sda);

    spawner.spawn(publish()).unwrap();
    spawner.spawn(session()).unwrap();

    // The scale is left alone until the session is up.
    loop {
        if let SessionEvent::Up = SESSION.wait().await {
            break;
        }
    }
    info!("session up, polling the scale");

    let mut monitor = Monitor::new(Config::default());
    monitor.connected();

    let mut ticker = Ticker::every(TICK);
    loop {
        match select(ticker.next(), SESSION.wait()).await {
            Either::First(()) => {
                let activity = monitor.tick(sample(&mut scl, &mut sda));
                apply(activity.commands, &mut scl, &mut sda);
                if activity.bus_abandoned {
                    warn!("bus stayed busy, dropping this poll");
                }
                if let Some(value) = activity.report {
                    trace!("scale value {=u16}", value);
                    if REPORTS.try_send(value).is_err() {
                        warn!("publish queue full, dropping {=u16}", value);
                    }
                }
            }
            Either::Second(SessionEvent::Up) => monitor.connected(),
            Either::Second(SessionEvent::Error) => {
                warn!("session error, asking the scale to reset");
                monitor.connection_error();
            }
        }
    }
}
