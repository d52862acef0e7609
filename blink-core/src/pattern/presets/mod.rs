//! Canonical pattern tables shared by firmware and host targets.
//!
//! Each submodule holds one family of `const` tables together with the named
//! timing constants the tables are built from, so targets can reference the
//! same flash-resident data instead of re-declaring timings.

pub mod blink;
pub mod burst;
pub mod steady;

pub use blink::{FAST_BLINK, FLASH, SLOW_BLINK};
pub use burst::BURST;
pub use steady::{DARK, STEADY_ON};
