use button_service::{Button, ButtonConfig, ButtonState, ChannelSink, Event};
use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use log::info;
use static_cell::StaticCell;

/// Simulated active-low button line
mod line {
    use core::convert::Infallible;
    use core::sync::atomic::{AtomicBool, Ordering};

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::signal::Signal;
    use embassy_time::Timer;
    use embedded_hal::digital::{ErrorType, InputPin};
    use embedded_hal_async::digital::Wait;

    static LEVEL: AtomicBool = AtomicBool::new(true);
    static EDGE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

    fn set_high(high: bool) {
        if LEVEL.swap(high, Ordering::SeqCst) != high {
            EDGE.signal(());
        }
    }

    /// Drives the line to `high` with a few millisecond-long bounces first.
    pub async fn bounce_to(high: bool) {
        for _ in 0..3 {
            set_high(high);
            Timer::after_millis(2).await;
            set_high(!high);
            Timer::after_millis(1).await;
        }
        set_high(high);
    }

    pub struct Pin;

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(LEVEL.load(Ordering::SeqCst))
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!LEVEL.load(Ordering::SeqCst))
        }
    }

    impl Wait for Pin {
        async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
            while !LEVEL.load(Ordering::SeqCst) {
                EDGE.wait().await;
            }
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
            while LEVEL.load(Ordering::SeqCst) {
                EDGE.wait().await;
            }
            Ok(())
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
            self.wait_for_low().await?;
            self.wait_for_high().await
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
            self.wait_for_high().await?;
            self.wait_for_low().await
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
            EDGE.wait().await;
            Ok(())
        }
    }
}

static STATE: ButtonState<CriticalSectionRawMutex> = ButtonState::new();
static EVENTS: Channel<CriticalSectionRawMutex, Event, 8> = Channel::new();

#[embassy_executor::task]
async fn button() {
    let config = ButtonConfig::default().with_click_events(true);
    let mut button = Button::new(&STATE, line::Pin, config, ChannelSink::new(&EVENTS)).unwrap();

    info!("Button task");
    button.run().await
}

#[embassy_executor::task]
async fn listener() {
    loop {
        let event = EVENTS.receive().await;
        info!("Received {:?}, button is now {:?}", event, STATE.classification());
    }
}

/// Pretends to be a user pressing the button
#[embassy_executor::task]
async fn user() {
    // Let the button take its first sample
    Timer::after_millis(100).await;

    loop {
        info!("Single click");
        line::bounce_to(false).await;
        Timer::after_millis(150).await;
        line::bounce_to(true).await;
        Timer::after_secs(1).await;

        info!("Double click");
        for _ in 0..2 {
            line::bounce_to(false).await;
            Timer::after_millis(100).await;
            line::bounce_to(true).await;
            Timer::after_millis(100).await;
        }
        Timer::after_secs(1).await;

        info!("Long press");
        line::bounce_to(false).await;
        Timer::after_millis(1500).await;
        line::bounce_to(true).await;
        Timer::after_secs(2).await;
    }
}

#[embassy_executor::task]
async fn run(spawner: Spawner) {
    spawner.must_spawn(button());
    spawner.must_spawn(listener());
    spawner.must_spawn(user());
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    static EXECUTOR: StaticCell<Executor> = StaticCell::new();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(run(spawner));
    });
}
