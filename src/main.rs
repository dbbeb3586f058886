#![no_std]
#![no_main]

mod board;
mod drivers;

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{AnyPin, Level, Output, Pin, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Duration, Ticker};
use {defmt_rtt as _, panic_probe as _};

use agl_altimeter::config::{LOOP_HZ, MAX_TASKS};
use agl_altimeter::tasks::baro_task::BaroTaskConfig;
use agl_altimeter::{
    BaroTask, DisplayTask, Fault, GraphicsDisplay, Scheduler, SchedulerError, SharedReading, Task,
};

use crate::board::Board;
use crate::drivers::bmp388::Bmp388;
use crate::drivers::hx8357::Hx8357;

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV  => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER  => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

// ── Heartbeat ─────────────────────────────────────────────────────────────────
/// Blinks the board LED at 1 Hz while the loop is alive.
struct Heartbeat<'d> {
    led: Output<'d, AnyPin>,
    ticks: u64,
}

impl<'d> Heartbeat<'d> {
    fn new(led: Output<'d, AnyPin>) -> Self {
        Self { led, ticks: 0 }
    }
}

impl Task for Heartbeat<'_> {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    fn init(&mut self) -> Result<(), Fault> {
        self.led.set_high();
        Ok(())
    }

    fn tick(&mut self) {
        self.ticks += 1;
        if self.ticks % (LOOP_HZ / 2) == 0 {
            self.led.toggle();
        }
    }
}

/// Registration order is tick order.
fn schedule<'a>(
    baro: &'a mut dyn Task,
    display: &'a mut dyn Task,
    heartbeat: &'a mut dyn Task,
) -> Result<Scheduler<'a, MAX_TASKS>, SchedulerError> {
    Ok(Scheduler::builder()
        .register(baro)?
        .register(display)?
        .register(heartbeat)?
        .build())
}

/// Unrecoverable start-up error: report and stop here.
fn halt(e: SchedulerError) -> ! {
    error!("halted: {}", e);
    loop {
        cortex_m::asm::nop();
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. I2C1 @ 400 kHz: BMP388 (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        TimeHertz(400_000),
        Default::default(),
    );
    let baro = Bmp388::new(i2c);

    // 3. SPI1 @ 21 MHz: HX8357D TFT (SCK=PA5, MOSI=PA7, MISO=PA6, CS=PA4, DC=PB1)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(21_000_000);
    let spi = Spi::new(
        p.SPI1,
        p.PA5, p.PA7, p.PA6,
        NoDma, NoDma,
        spi_config,
    );
    let cs_tft = Output::new(p.PA4.degrade(), Level::High, Speed::VeryHigh);
    let dc_tft = Output::new(p.PB1.degrade(), Level::High, Speed::VeryHigh);
    let panel = Hx8357::new(spi, cs_tft, dc_tft);

    // 4. Heartbeat LED (PC13)
    let led = Output::new(p.PC13.degrade(), Level::High, Speed::Low);

    // 5. Tasks, in tick order: sample, draw, blink
    let reading = SharedReading::default();
    let mut baro_task = BaroTask::new(baro, &reading, BaroTaskConfig::default());
    let mut display_task = DisplayTask::new(GraphicsDisplay::new(panel), &reading);
    let mut heartbeat = Heartbeat::new(led);

    let mut scheduler = match schedule(&mut baro_task, &mut display_task, &mut heartbeat) {
        Ok(scheduler) => scheduler,
        Err(e) => halt(e),
    };

    // 6. Setup: any fault here is fatal
    if let Err(e) = scheduler.run_setup() {
        halt(e);
    }
    info!("altimeter running, {} tasks @ {} Hz", scheduler.len(), LOOP_HZ);

    // 7. Loop
    let mut ticker = Ticker::every(Duration::from_hz(LOOP_HZ));
    loop {
        if let Err(e) = scheduler.run_loop() {
            halt(e);
        }
        ticker.next().await;
    }
}
