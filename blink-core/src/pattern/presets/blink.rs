//! Two-state toggle patterns.
//!
//! The simplest automata: a high slot and a low slot pointing at each other,
//! cycling forever. The asymmetric `FLASH` table gives a short pulse with a
//! long dark interval, the classic activity-indicator shape.

use super::super::{Level, Pattern, StateDef};

/// Dwell for each half of the slow symmetric toggle.
pub const SLOW_BLINK_HALF_MS: u32 = 500;
/// Dwell for each half of the fast symmetric toggle.
pub const FAST_BLINK_HALF_MS: u32 = 100;
/// Lit interval of the flash pattern.
pub const FLASH_ON_MS: u32 = 100;
/// Dark interval of the flash pattern.
pub const FLASH_OFF_MS: u32 = 900;

/// State table for [`SLOW_BLINK`].
pub const SLOW_BLINK_STATES: [StateDef; 2] = [
    StateDef::drive(Level::High, SLOW_BLINK_HALF_MS, 1),
    StateDef::drive(Level::Low, SLOW_BLINK_HALF_MS, 0),
];

/// Symmetric 1 Hz toggle.
pub const SLOW_BLINK: Pattern = Pattern::new("slow-blink", &SLOW_BLINK_STATES);

/// State table for [`FAST_BLINK`].
pub const FAST_BLINK_STATES: [StateDef; 2] = [
    StateDef::drive(Level::High, FAST_BLINK_HALF_MS, 1),
    StateDef::drive(Level::Low, FAST_BLINK_HALF_MS, 0),
];

/// Symmetric 5 Hz toggle.
pub const FAST_BLINK: Pattern = Pattern::new("fast-blink", &FAST_BLINK_STATES);

/// State table for [`FLASH`].
pub const FLASH_STATES: [StateDef; 2] = [
    StateDef::drive(Level::High, FLASH_ON_MS, 1),
    StateDef::drive(Level::Low, FLASH_OFF_MS, 0),
];

/// Short pulse once a second.
pub const FLASH: Pattern = Pattern::new("flash", &FLASH_STATES);
