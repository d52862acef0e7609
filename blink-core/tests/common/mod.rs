//! Shared test fixtures: a sink that remembers every write it sees.

use blink_core::pattern::Level;
use blink_core::scheduler::{Millis, OutputSink, PinId};

/// Write captured by [`CaptureSink`] with the tick time it happened at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Write {
    pub at: Millis,
    pub pin: PinId,
    pub level: Level,
}

/// Output sink that records every write alongside an externally set clock.
pub struct CaptureSink {
    pub now: Millis,
    pub writes: Vec<Write>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            now: Millis::ZERO,
            writes: Vec::new(),
        }
    }

    /// Returns the latest level written to `pin`, if any.
    pub fn level_of(&self, pin: PinId) -> Option<Level> {
        self.writes
            .iter()
            .rev()
            .find(|write| write.pin == pin)
            .map(|write| write.level)
    }

    /// Returns the writes applied to `pin` in order.
    pub fn writes_to(&self, pin: PinId) -> Vec<Write> {
        self.writes
            .iter()
            .copied()
            .filter(|write| write.pin == pin)
            .collect()
    }
}

impl OutputSink for CaptureSink {
    fn write(&mut self, pin: PinId, level: Level) {
        self.writes.push(Write {
            at: self.now,
            pin,
            level,
        });
    }

    fn all_off(&mut self) {
        // Force every pin this sink has seen to low, captured as writes.
        let mut pins: Vec<PinId> = Vec::new();
        for write in &self.writes {
            if !pins.contains(&write.pin) {
                pins.push(write.pin);
            }
        }
        for pin in pins {
            self.writes.push(Write {
                at: self.now,
                pin,
                level: Level::Low,
            });
        }
    }
}
