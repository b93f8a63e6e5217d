//! GPIO / peripheral pin assignments for the crockpot controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Relay / SSR (heating element switching)
// ---------------------------------------------------------------------------

/// Digital output driving the main heating-element relay.
pub const RELAY_MAIN_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// MAX31855 thermocouple converter (SPI, read-only device)
// ---------------------------------------------------------------------------

/// SPI chip select.
pub const MAX31855_CS_GPIO: i32 = 15;
/// SPI clock.
pub const MAX31855_CLK_GPIO: i32 = 14;
/// SPI MISO (the MAX31855 has no MOSI).
pub const MAX31855_MISO_GPIO: i32 = 12;

/// SPI clock speed in Hz (MAX31855 supports up to 5 MHz).
pub const MAX31855_SPI_HZ: u32 = 4_000_000;

// ---------------------------------------------------------------------------
// Front-panel buttons (active-low momentary, external pull-ups)
// ---------------------------------------------------------------------------

/// Steps the operating state up (towards HIGH).
pub const BUTTON_UP_GPIO: i32 = 32;
/// Steps the operating state down (towards OFF).
pub const BUTTON_DOWN_GPIO: i32 = 33;
/// Toggles between OFF and the default heating state.
pub const BUTTON_POWER_GPIO: i32 = 27;
