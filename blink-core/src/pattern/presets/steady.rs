//! Degenerate single-slot patterns.

use super::super::{Level, Pattern, StateDef};

/// Re-arm interval for the steady-on self transition.
pub const STEADY_REFRESH_MS: u32 = 1_000;

/// State table for [`STEADY_ON`].
pub const STEADY_ON_STATES: [StateDef; 1] =
    [StateDef::drive(Level::High, STEADY_REFRESH_MS, 0)];

/// Stays lit forever via a self transition.
pub const STEADY_ON: Pattern = Pattern::new("steady-on", &STEADY_ON_STATES);

/// State table for [`DARK`].
pub const DARK_STATES: [StateDef; 1] = [StateDef::Null];

/// Parks the device immediately; useful as a placeholder table entry.
pub const DARK: Pattern = Pattern::new("dark", &DARK_STATES);
