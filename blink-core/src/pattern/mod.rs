//! Blink pattern data structures shared by the scheduler and host targets.
//!
//! A pattern is a small table of finite-state-machine slots. Each slot either
//! drives the output to a physical level for a dwell interval, branches as a
//! loop sentinel, or parks the device. Everything in this module is `no_std`
//! friendly so the same tables can be compiled for both MCU firmware and
//! host-side tooling.

use core::fmt;

pub mod presets;

/// Physical output level driven onto an LED pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Returns the opposite level.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("low"),
            Level::High => f.write_str("high"),
        }
    }
}

/// Repeat budget carried by a loop slot.
///
/// An explicit `Forever` variant stands in for a magic counter value, so the
/// repeat budget can never be misread as a dwell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopCount {
    Finite(u8),
    Forever,
}

impl LoopCount {
    /// Returns `true` while another branch to the loop target is allowed.
    #[must_use]
    pub const fn allows(self, taken: u8) -> bool {
        match self {
            LoopCount::Finite(budget) => taken < budget,
            LoopCount::Forever => true,
        }
    }
}

/// One slot of a pattern's state table.
///
/// Packing an output tag, a dwell-or-repeat word, and a next-slot index into
/// one untyped record invites misreads; the tagged variants keep each field
/// meaningful on its own.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StateDef {
    /// Drive the output to `level` and hold it for `dwell_ms`, then move to
    /// slot `next`. Cycles between drive slots are the blink itself.
    Drive { level: Level, dwell_ms: u32, next: u8 },
    /// Control sentinel with no physical output: branch to `target` while
    /// the repeat budget lasts, fall through to `exit` once exhausted.
    Loop {
        repeats: LoopCount,
        target: u8,
        exit: u8,
    },
    /// Terminal no-op; the device entry is parked and skipped thereafter.
    Null,
}

impl StateDef {
    /// Builds a drive slot.
    #[must_use]
    pub const fn drive(level: Level, dwell_ms: u32, next: u8) -> Self {
        StateDef::Drive {
            level,
            dwell_ms,
            next,
        }
    }

    /// Builds a loop slot with a finite repeat budget.
    #[must_use]
    pub const fn loop_for(budget: u8, target: u8, exit: u8) -> Self {
        StateDef::Loop {
            repeats: LoopCount::Finite(budget),
            target,
            exit,
        }
    }

    /// Builds a loop slot that always branches back to `target`.
    #[must_use]
    pub const fn loop_forever(target: u8) -> Self {
        StateDef::Loop {
            repeats: LoopCount::Forever,
            target,
            // Never taken; points back at the target so the index stays valid.
            exit: target,
        }
    }

    /// Returns `true` for slots that carry no physical output level.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, StateDef::Loop { .. } | StateDef::Null)
    }
}

/// Immutable, named blink pattern table.
///
/// Tables are dynamically sized but immutable slices, so presets of any
/// length share one representation. Constructors are `const`, letting tables
/// live in flash.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pattern {
    name: &'static str,
    states: &'static [StateDef],
}

impl Pattern {
    /// Creates a pattern over a static state table.
    #[must_use]
    pub const fn new(name: &'static str, states: &'static [StateDef]) -> Self {
        Self { name, states }
    }

    /// Returns the pattern's human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the ordered state slots that make up the pattern.
    #[must_use]
    pub const fn states(&self) -> &'static [StateDef] {
        self.states
    }

    /// Returns the number of slots in the table.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` when the table holds no slots.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Checks the table against the authoring-time configuration contract.
    ///
    /// Verifies that every slot index stays inside the table and that each
    /// loop slot reaches a non-loop slot through its `target` chain within
    /// the table length. The scheduler does not require a validated table;
    /// it degrades a malformed one at runtime by parking the entry, but
    /// authors should catch the fault here instead.
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.states.is_empty() {
            return Err(PatternError::Empty);
        }

        let len = self.states.len();
        let in_range = |index: u8| (index as usize) < len;

        for (slot, state) in self.states.iter().enumerate() {
            match *state {
                StateDef::Drive { next, .. } => {
                    if !in_range(next) {
                        return Err(PatternError::SlotOutOfRange { slot, index: next });
                    }
                }
                StateDef::Loop { target, exit, .. } => {
                    if !in_range(target) {
                        return Err(PatternError::SlotOutOfRange {
                            slot,
                            index: target,
                        });
                    }
                    if !in_range(exit) {
                        return Err(PatternError::SlotOutOfRange { slot, index: exit });
                    }
                    if !self.loop_resolves(slot) {
                        return Err(PatternError::UnresolvableLoop { slot });
                    }
                }
                StateDef::Null => {}
            }
        }

        Ok(())
    }

    /// Walks the `target` chain from a loop slot, bounded by the table
    /// length, looking for a non-loop slot.
    fn loop_resolves(&self, slot: usize) -> bool {
        let mut current = slot;
        for _ in 0..self.states.len() {
            match self.states[current] {
                StateDef::Loop { target, .. } => {
                    let target = target as usize;
                    if target >= self.states.len() {
                        return false;
                    }
                    current = target;
                }
                _ => return true,
            }
        }
        false
    }
}

/// Configuration faults detectable at table-authoring time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PatternError {
    /// Table contains no slots.
    Empty,
    /// A slot references an index outside the table.
    SlotOutOfRange { slot: usize, index: u8 },
    /// A loop slot's target chain never reaches a non-loop slot.
    UnresolvableLoop { slot: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
