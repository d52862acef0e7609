//! Burst pattern: a run of fast pulses followed by a long pause.
//!
//! This is the table shape the loop sentinel exists for. Slots 0 and 1 form
//! the pulse body, slot 2 branches back through the body until its repeat
//! budget is spent, and slot 3 holds the pause before the whole cycle
//! restarts.

use super::super::{Level, Pattern, StateDef};

/// Lit interval of one pulse in the burst body.
pub const BURST_ON_MS: u32 = 50;
/// Dark interval between pulses in the burst body.
pub const BURST_OFF_MS: u32 = 100;
/// Loop-back budget of the burst sentinel.
///
/// The pulse body runs once before the loop slot is first consulted, so a
/// burst shows `BURST_REPEATS + 1` pulses total.
pub const BURST_REPEATS: u8 = 3;
/// Pause after the burst before the cycle restarts.
pub const BURST_PAUSE_MS: u32 = 800;

/// State table for [`BURST`].
pub const BURST_STATES: [StateDef; 4] = [
    StateDef::drive(Level::High, BURST_ON_MS, 1),
    StateDef::drive(Level::Low, BURST_OFF_MS, 2),
    StateDef::loop_for(BURST_REPEATS, 0, 3),
    StateDef::drive(Level::Low, BURST_PAUSE_MS, 0),
];

/// Four fast pulses, then an 800 ms pause, repeating.
pub const BURST: Pattern = Pattern::new("burst", &BURST_STATES);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::LoopCount;

    #[test]
    fn burst_table_validates() {
        assert!(BURST.validate().is_ok());
        assert_eq!(BURST.len(), 4);
    }

    #[test]
    fn loop_slot_branches_back_through_the_body() {
        let StateDef::Loop {
            repeats,
            target,
            exit,
        } = BURST_STATES[2]
        else {
            panic!("slot 2 must be the loop sentinel");
        };
        assert_eq!(repeats, LoopCount::Finite(BURST_REPEATS));
        assert_eq!(target, 0);
        assert_eq!(exit, 3);
    }
}
