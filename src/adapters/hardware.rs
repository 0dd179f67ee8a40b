//! GPIO bus adapter over `embedded-hal` traits.
//!
//! [`PinBankBus`] implements the [`GpioBus`] port for any bank of
//! `OutputPin`s plus a `DelayNs` source. On the ESP32 the bank is built
//! from `esp-idf-hal` `PinDriver`s and the `Ets` busy-wait delay; on the
//! host, tests plug in whatever doubles they need.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::GpioBus;

/// Maximum lines the bank can hold: 3 + 4 select lines plus the shared
/// enable.
pub const MAX_BANK_PINS: usize = 8;

/// A fixed bank of output lines addressed by GPIO number.
pub struct PinBankBus<P: OutputPin, D: DelayNs> {
    pins: heapless::Vec<(i32, P), MAX_BANK_PINS>,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> PinBankBus<P, D> {
    pub fn new(delay: D) -> Self {
        Self {
            pins: heapless::Vec::new(),
            delay,
        }
    }

    /// Register one output line under its GPIO number. Returns the pin
    /// back when the bank is full.
    pub fn add_pin(&mut self, gpio: i32, pin: P) -> Result<(), P> {
        self.pins.push((gpio, pin)).map_err(|(_, pin)| pin)
    }
}

impl<P: OutputPin, D: DelayNs> GpioBus for PinBankBus<P, D> {
    fn write(&mut self, gpio: i32, high: bool) {
        let Some((_, pin)) = self.pins.iter_mut().find(|(num, _)| *num == gpio) else {
            warn!("PinBankBus: write to unregistered GPIO {gpio}");
            return;
        };
        let result = if high { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            warn!("PinBankBus: GPIO {gpio} write failed");
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

// ---------------------------------------------------------------------------
// ESP32 constructor
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
pub mod esp {
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

    use super::PinBankBus;
    use crate::error::{Error, Result};
    use crate::pins;

    pub type EspGpioBus = PinBankBus<PinDriver<'static, AnyOutputPin, Output>, Ets>;

    /// Build the bus with every multiplexer line registered. Call once at
    /// startup: claims the select and enable GPIOs by number.
    pub fn matrix_gpio_bus() -> Result<EspGpioBus> {
        let mut bus = PinBankBus::new(Ets);

        let mut claim = |gpio: i32| -> Result<()> {
            // SAFETY: each GPIO number is claimed exactly once, at startup.
            let any = unsafe { AnyOutputPin::new(gpio) };
            let driver =
                PinDriver::output(any).map_err(|_| Error::Init("GPIO driver allocation failed"))?;
            bus.add_pin(gpio, driver)
                .map_err(|_| Error::Init("GPIO bank full"))?;
            Ok(())
        };

        for gpio in pins::MUX_ROW_SELECT {
            claim(gpio)?;
        }
        for gpio in pins::MUX_COL_SELECT {
            claim(gpio)?;
        }
        claim(pins::MUX_ENABLE_GPIO)?;

        Ok(bus)
    }
}
