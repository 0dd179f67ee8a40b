//! Driver for one HP4067 1-of-N analog switch.
//!
//! Converts a channel address into a bit pattern on the select lines.
//! Address writes are suppressed when the requested channel is already
//! selected, to minimise electrical settling events; after any real change
//! the driver executes the settle delay synchronously before returning, so
//! callers may rely on the new connection immediately.

use log::warn;

use crate::app::ports::GpioBus;
use crate::error::AddressingError;

/// Up to four select lines (16-channel part; the row switch uses three
/// with S3 tied to GND).
const MAX_SELECT_LINES: usize = 4;

pub struct MuxSwitch {
    /// Role tag for log messages ("row" / "col").
    name: &'static str,
    /// Select line GPIOs, LSB first.
    select_lines: heapless::Vec<i32, MAX_SELECT_LINES>,
    /// Valid channels are `[0, channel_count)`.
    channel_count: u8,
    current: u8,
    /// False until `init` has driven the lines to a known state; the first
    /// write is never suppressed.
    initialized: bool,
}

impl MuxSwitch {
    /// `select_lines` LSB first; `channel_count` bounds valid addresses
    /// (8 for the row switch, 12 for the column switch).
    pub fn new(name: &'static str, select_lines: &[i32], channel_count: u8) -> Self {
        debug_assert!(select_lines.len() <= MAX_SELECT_LINES);
        debug_assert!((channel_count as usize) <= (1 << select_lines.len()));
        Self {
            name,
            select_lines: heapless::Vec::from_slice(select_lines)
                .unwrap_or_else(|()| heapless::Vec::new()),
            channel_count,
            current: 0,
            initialized: false,
        }
    }

    /// Drive all select lines to channel 0 unconditionally.
    pub fn init(&mut self, bus: &mut impl GpioBus, settle_us: u32) {
        self.initialized = false;
        self.current = 0;
        self.write_lines(bus, 0, settle_us);
        self.initialized = true;
    }

    /// Select `address`. Out-of-range requests are rejected and logged,
    /// leaving the previous address unchanged. Writes are suppressed when
    /// the address already matches.
    pub fn set_address(
        &mut self,
        bus: &mut impl GpioBus,
        address: u8,
        settle_us: u32,
    ) -> Result<(), AddressingError> {
        if address >= self.channel_count {
            warn!(
                "MuxSwitch({}): rejected address {} (valid 0..{})",
                self.name, address, self.channel_count
            );
            return Err(AddressingError::ChannelOutOfRange(address));
        }

        if self.initialized && address == self.current {
            return Ok(());
        }

        self.write_lines(bus, address, settle_us);
        self.current = address;
        Ok(())
    }

    /// Currently selected channel.
    pub fn address(&self) -> u8 {
        self.current
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    fn write_lines(&self, bus: &mut impl GpioBus, address: u8, settle_us: u32) {
        for (bit, gpio) in self.select_lines.iter().enumerate() {
            bus.write(*gpio, address & (1 << bit) != 0);
        }
        // Analog settle time after a real address change.
        bus.delay_us(settle_us);
    }
}
