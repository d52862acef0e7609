//! Scheduler event catalog and ring recorder shared by all targets.
//!
//! The scheduler core has no logging facade; observable effects are captured
//! as strongly typed events that can be serialized to compact numeric codes
//! for transport over a diagnostics channel. The host emulator prints the
//! ring directly; an MCU port would drain the same ring over its own
//! transport.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::pattern::Level;
use crate::scheduler::{Millis, PinId};

/// Identifier assigned to recorded events in emission order.
pub type EventId = u32;

/// Default capacity of the event ring.
pub const EVENT_RING_CAPACITY: usize = 32;

/// Configuration faults the scheduler can detect while ticking.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultKind {
    /// Loop resolution exceeded the pattern length without reaching a
    /// drive or null slot.
    LoopChainUnresolved,
    /// A slot index referenced a position outside the pattern table.
    SlotOutOfRange,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::LoopChainUnresolved => f.write_str("loop-chain-unresolved"),
            FaultKind::SlotOutOfRange => f.write_str("slot-out-of-range"),
        }
    }
}

/// Discriminated scheduler events shared across all targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlinkEventKind {
    /// A physical level was driven onto an output.
    LevelWritten(PinId, Level),
    /// A finite loop spent its repeat budget and fell through.
    LoopExhausted(PinId),
    /// An entry reached a null slot and left the schedule.
    EntryParked(PinId),
    /// A malformed table froze its entry.
    PatternFault(PinId, FaultKind),
    /// Escape hatch for codes this catalog does not know.
    Custom(u16),
}

impl fmt::Display for BlinkEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlinkEventKind::LevelWritten(pin, level) => write!(f, "level-written {pin} {level}"),
            BlinkEventKind::LoopExhausted(pin) => write!(f, "loop-exhausted {pin}"),
            BlinkEventKind::EntryParked(pin) => write!(f, "entry-parked {pin}"),
            BlinkEventKind::PatternFault(pin, fault) => write!(f, "pattern-fault {pin} {fault}"),
            BlinkEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl BlinkEventKind {
    const LEVEL_LOW_BASE: u16 = 0x01;
    const LEVEL_HIGH_BASE: u16 = 0x02;
    const LOOP_EXHAUSTED_BASE: u16 = 0x03;
    const ENTRY_PARKED_BASE: u16 = 0x04;
    const FAULT_LOOP_CHAIN_BASE: u16 = 0x05;
    const FAULT_SLOT_RANGE_BASE: u16 = 0x06;

    /// Encodes the event into a compact transport-friendly code.
    ///
    /// The event class lives in the high byte, the pin number in the low
    /// byte. [`Custom`](Self::Custom) codes pass through untouched.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            BlinkEventKind::LevelWritten(pin, Level::Low) => {
                (Self::LEVEL_LOW_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::LevelWritten(pin, Level::High) => {
                (Self::LEVEL_HIGH_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::LoopExhausted(pin) => {
                (Self::LOOP_EXHAUSTED_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::EntryParked(pin) => {
                (Self::ENTRY_PARKED_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::PatternFault(pin, FaultKind::LoopChainUnresolved) => {
                (Self::FAULT_LOOP_CHAIN_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::PatternFault(pin, FaultKind::SlotOutOfRange) => {
                (Self::FAULT_SLOT_RANGE_BASE << 8) | pin.as_u8() as u16
            }
            BlinkEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw code, falling back to [`Custom`](Self::Custom).
    #[must_use]
    pub const fn from_raw(code: u16) -> Self {
        let pin = PinId::new((code & 0x00FF) as u8);
        match code >> 8 {
            Self::LEVEL_LOW_BASE => BlinkEventKind::LevelWritten(pin, Level::Low),
            Self::LEVEL_HIGH_BASE => BlinkEventKind::LevelWritten(pin, Level::High),
            Self::LOOP_EXHAUSTED_BASE => BlinkEventKind::LoopExhausted(pin),
            Self::ENTRY_PARKED_BASE => BlinkEventKind::EntryParked(pin),
            Self::FAULT_LOOP_CHAIN_BASE => {
                BlinkEventKind::PatternFault(pin, FaultKind::LoopChainUnresolved)
            }
            Self::FAULT_SLOT_RANGE_BASE => {
                BlinkEventKind::PatternFault(pin, FaultKind::SlotOutOfRange)
            }
            _ => BlinkEventKind::Custom(code),
        }
    }
}

/// Timestamped event with its emission-order identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlinkRecord {
    pub id: EventId,
    pub event: BlinkEventKind,
    pub at: Millis,
}

/// Ring recorder capturing the most recent scheduler events.
pub struct EventRecorder<const CAPACITY: usize = EVENT_RING_CAPACITY> {
    ring: HistoryBuf<BlinkRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> EventRecorder<CAPACITY> {
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an arbitrary event, returning its identifier.
    pub fn record(&mut self, event: BlinkEventKind, at: Millis) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(BlinkRecord { id, event, at });
        id
    }

    /// Records a physical write of `level` to `pin`.
    pub fn record_level_written(&mut self, pin: PinId, level: Level, at: Millis) -> EventId {
        self.record(BlinkEventKind::LevelWritten(pin, level), at)
    }

    /// Records a finite loop falling through after spending its budget.
    pub fn record_loop_exhausted(&mut self, pin: PinId, at: Millis) -> EventId {
        self.record(BlinkEventKind::LoopExhausted(pin), at)
    }

    /// Records an entry leaving the schedule through a null slot.
    pub fn record_parked(&mut self, pin: PinId, at: Millis) -> EventId {
        self.record(BlinkEventKind::EntryParked(pin), at)
    }

    /// Records a configuration fault freezing an entry.
    pub fn record_fault(&mut self, pin: PinId, fault: FaultKind, at: Millis) -> EventId {
        self.record(BlinkEventKind::PatternFault(pin, fault), at)
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&BlinkRecord> {
        self.ring.recent()
    }

    /// Returns an iterator over the records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, BlinkRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const CAPACITY: usize> Default for EventRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
