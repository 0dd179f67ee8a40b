//! CardMatrix Firmware — Main Entry Point
//!
//! Hexagonal architecture: one PN532 reader multiplexed across a 96-cell
//! antenna matrix, driven by a pure-logic core behind port traits.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  PinBankBus     Pn532Reader    LogEventSink   Esp32Time      │
//! │  (GpioBus)      (ReaderPort)   (EventSink)                   │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │            MatrixService (pure logic)                │    │
//! │  │  Supervisor FSM · CellAddressing · ReaderSession     │    │
//! │  │               · ScanEngine                            │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::info;

use cardmatrix::adapters::hardware::esp::matrix_gpio_bus;
use cardmatrix::adapters::log_sink::LogEventSink;
use cardmatrix::adapters::pn532::Pn532Reader;
use cardmatrix::adapters::time::Esp32TimeAdapter;
use cardmatrix::app::service::MatrixService;
use cardmatrix::config::MatrixConfig;
use cardmatrix::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CardMatrix v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals ───────────────────────────────
    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Peripheral take failed: {} — halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQUENCY_HZ));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &i2c_config,
    )?;

    let mut bus = match matrix_gpio_bus() {
        Ok(b) => b,
        Err(e) => {
            // Select-line allocation failure is critical — nothing to scan.
            log::error!("GPIO bank init failed: {} — halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }
    };

    let mut reader = Pn532Reader::new(i2c);
    let mut sink = LogEventSink::new();
    let time = Esp32TimeAdapter::new();

    // ── 3. Service bring-up ───────────────────────────────────
    let config = MatrixConfig::default();
    let mut service = MatrixService::new(config);

    if let Err(e) = service.initialize(&mut bus, &mut reader, time.uptime_ms()) {
        // Reader bring-up exhausted its retry budget. The watchdog will
        // reset us; until then stay parked rather than scan a dead bus.
        log::error!("Reader bring-up failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    info!("System ready. Entering scan loop.");

    // ── 4. Scan loop ──────────────────────────────────────────
    loop {
        service.tick(&mut bus, &mut reader, &mut sink, time.uptime_ms());
        // Yield to FreeRTOS so the idle task can feed the watchdog.
        FreeRtos::delay_ms(1);
    }
}
