//! GPIO / peripheral pin assignments for the CardMatrix main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// HP4067 multiplexer #1 — row selector (channels 0-7, S3 tied to GND)
// ---------------------------------------------------------------------------

pub const MUX_ROW_S0_GPIO: i32 = 4;
pub const MUX_ROW_S1_GPIO: i32 = 5;
pub const MUX_ROW_S2_GPIO: i32 = 15;

/// Row selector select lines, LSB first. S3 is hard-wired to GND for
/// 8-channel operation, so only three lines are driven.
pub const MUX_ROW_SELECT: [i32; 3] = [MUX_ROW_S0_GPIO, MUX_ROW_S1_GPIO, MUX_ROW_S2_GPIO];

// ---------------------------------------------------------------------------
// HP4067 multiplexer #2 — column selector (channels 0-11)
// ---------------------------------------------------------------------------

pub const MUX_COL_S0_GPIO: i32 = 18;
pub const MUX_COL_S1_GPIO: i32 = 19;
pub const MUX_COL_S2_GPIO: i32 = 23;
pub const MUX_COL_S3_GPIO: i32 = 25;

/// Column selector select lines, LSB first.
pub const MUX_COL_SELECT: [i32; 4] = [
    MUX_COL_S0_GPIO,
    MUX_COL_S1_GPIO,
    MUX_COL_S2_GPIO,
    MUX_COL_S3_GPIO,
];

/// Shared enable for both multiplexers (active LOW). One line saves a GPIO;
/// both switches are enabled and disabled together.
pub const MUX_ENABLE_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// I²C bus — PN532 reader
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

/// 100 kHz for stable operation with the PN532 breakout.
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// 7-bit I²C address of the PN532 (fixed by the chip).
pub const PN532_I2C_ADDR: u8 = 0x24;
