//! Cooperative tick scheduler driving the per-device pattern automata.
//!
//! The scheduler owns a table of [`LedEntry`] records and is polled once per
//! control-loop pass with the current monotonic time. Only entries whose
//! dwell has elapsed perform a transition, so a `tick` call is bounded by the
//! number of devices, never by a dwell interval. Reading the clock and
//! writing the physical pin stay behind the caller and the [`OutputSink`]
//! seam respectively; nothing here blocks or suspends.

use core::fmt;

use heapless::Vec;

use crate::pattern::{Level, Pattern, StateDef};
use crate::telemetry::{EventRecorder, FaultKind};

/// Monotonic millisecond timestamp with `u32` wraparound semantics.
///
/// Deadline checks use modular subtraction, so comparisons stay correct
/// across counter wraparound as long as the real separation between the two
/// instants is under half the counter range (~24.8 days).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Millis(u32);

impl Millis {
    /// Timestamp at the counter origin.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns this instant advanced by `ms`, wrapping at the counter limit.
    #[must_use]
    pub const fn wrapping_add_ms(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Returns `true` once `self` is at or past `deadline`, modulo wraparound.
    #[must_use]
    pub const fn has_reached(self, deadline: Self) -> bool {
        self.0.wrapping_sub(deadline.0) < u32::MAX / 2
    }
}

/// Identifier of the physical output a device entry drives.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinId(u8);

impl PinId {
    /// Wraps a raw pin number.
    #[must_use]
    pub const fn new(pin: u8) -> Self {
        Self(pin)
    }

    /// Returns the raw pin number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write as _;

        // Render into a scratch buffer so width and alignment flags apply.
        let mut label = heapless::String::<8>::new();
        write!(label, "pin{}", self.0)?;
        f.pad(&label)
    }
}

/// Abstraction over the physical output drivers.
pub trait OutputSink {
    /// Drives the given level onto the output; assumed to always succeed.
    fn write(&mut self, pin: PinId, level: Level);

    /// Forces every output low.
    fn all_off(&mut self);
}

/// Output sink that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputSink;

impl NoopOutputSink {
    /// Creates a new no-op output sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutputSink for NoopOutputSink {
    fn write(&mut self, _: PinId, _: Level) {}

    fn all_off(&mut self) {}
}

/// One device's complete automaton instance.
///
/// Constructed once when the table is brought up; only the scheduler mutates
/// it afterwards. A `wakeup` of `None` marks the entry as parked: either a
/// `Null` slot was reached or a configuration fault froze the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LedEntry {
    pin: PinId,
    pattern: Pattern,
    current: usize,
    loops_taken: u8,
    wakeup: Option<Millis>,
}

impl LedEntry {
    /// Creates an entry at slot 0, due on the first tick at or after `now`.
    #[must_use]
    pub const fn new(pin: PinId, pattern: Pattern, now: Millis) -> Self {
        Self {
            pin,
            pattern,
            current: 0,
            loops_taken: 0,
            wakeup: Some(now),
        }
    }

    /// Returns the output this entry drives.
    #[must_use]
    pub const fn pin(&self) -> PinId {
        self.pin
    }

    /// Returns the pattern table backing this entry.
    #[must_use]
    pub const fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Returns the index of the slot evaluated on the next due tick.
    #[must_use]
    pub const fn current_slot(&self) -> usize {
        self.current
    }

    /// Returns the instant at which the current dwell expires, if armed.
    #[must_use]
    pub const fn wakeup(&self) -> Option<Millis> {
        self.wakeup
    }

    /// Returns `true` when the entry no longer participates in scheduling.
    #[must_use]
    pub const fn is_parked(&self) -> bool {
        self.wakeup.is_none()
    }
}

/// Default device-table capacity.
pub const MAX_LEDS: usize = 8;

/// Error surfaced when a device cannot be added to the table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddError {
    /// Device table has reached its capacity.
    TableFull,
}

impl fmt::Display for AddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Polled scheduler owning the device table.
///
/// Entries are evaluated in table order and transitions are applied
/// independently; no entry's transition is observable by another within the
/// same tick.
pub struct Scheduler<const N: usize = MAX_LEDS> {
    entries: Vec<LedEntry, N>,
}

impl<const N: usize> Scheduler<N> {
    /// Creates a scheduler with an empty device table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a device to the table.
    ///
    /// The pattern is taken as-is; run [`Pattern::validate`] at authoring
    /// time. A malformed table never raises a runtime error here; the
    /// affected entry degrades per the fault rules in [`tick`](Self::tick).
    pub fn add(&mut self, pin: PinId, pattern: Pattern, now: Millis) -> Result<(), AddError> {
        self.entries
            .push(LedEntry::new(pin, pattern, now))
            .map_err(|_| AddError::TableFull)
    }

    /// Returns the device table in evaluation order.
    #[must_use]
    pub fn entries(&self) -> &[LedEntry] {
        &self.entries
    }

    /// Looks up the entry driving `pin`.
    #[must_use]
    pub fn entry(&self, pin: PinId) -> Option<&LedEntry> {
        self.entries.iter().find(|entry| entry.pin == pin)
    }

    /// Parks every entry and forces all outputs low.
    ///
    /// Later ticks are no-ops until a new table is built; the bank stays
    /// dark.
    pub fn shutdown<S>(&mut self, sink: &mut S)
    where
        S: OutputSink,
    {
        for entry in &mut self.entries {
            entry.wakeup = None;
        }
        sink.all_off();
    }

    /// Evaluates every due entry once and returns the number of writes made.
    ///
    /// Loop slots resolve synchronously within the call: a loop has no
    /// physical level to hold, so resolution continues until a drive slot
    /// arms its dwell or a null slot parks the entry. Resolution is capped
    /// at the pattern length; exceeding the cap is a configuration fault
    /// that parks the entry and records a [`FaultKind::LoopChainUnresolved`]
    /// event once, leaving every other device running.
    pub fn tick<S, const C: usize>(
        &mut self,
        now: Millis,
        sink: &mut S,
        recorder: &mut EventRecorder<C>,
    ) -> usize
    where
        S: OutputSink,
    {
        let mut writes = 0;

        for entry in &mut self.entries {
            let Some(deadline) = entry.wakeup else {
                continue;
            };
            if !now.has_reached(deadline) {
                continue;
            }
            writes += step_entry(entry, now, sink, recorder);
        }

        writes
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one transition for a due entry, resolving loop slots in place.
fn step_entry<S, const C: usize>(
    entry: &mut LedEntry,
    now: Millis,
    sink: &mut S,
    recorder: &mut EventRecorder<C>,
) -> usize
where
    S: OutputSink,
{
    let states = entry.pattern.states();
    let mut control_hops = 0;

    loop {
        let Some(state) = states.get(entry.current) else {
            // Out-of-range slot index; freeze the entry rather than guess.
            entry.wakeup = None;
            recorder.record_fault(entry.pin, FaultKind::SlotOutOfRange, now);
            return 0;
        };

        match *state {
            StateDef::Drive {
                level,
                dwell_ms,
                next,
            } => {
                sink.write(entry.pin, level);
                recorder.record_level_written(entry.pin, level, now);
                entry.wakeup = Some(now.wrapping_add_ms(dwell_ms));
                entry.current = next as usize;
                return 1;
            }
            StateDef::Loop {
                repeats,
                target,
                exit,
            } => {
                if control_hops >= states.len() {
                    entry.wakeup = None;
                    recorder.record_fault(entry.pin, FaultKind::LoopChainUnresolved, now);
                    return 0;
                }
                control_hops += 1;

                if repeats.allows(entry.loops_taken) {
                    entry.loops_taken = entry.loops_taken.saturating_add(1);
                    entry.current = target as usize;
                } else {
                    // Budget spent; recycle the counter for the next visit.
                    entry.loops_taken = 0;
                    recorder.record_loop_exhausted(entry.pin, now);
                    entry.current = exit as usize;
                }
            }
            StateDef::Null => {
                entry.wakeup = None;
                recorder.record_parked(entry.pin, now);
                return 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::presets::{DARK, FLASH, STEADY_ON};
    use crate::telemetry::BlinkEventKind;

    #[derive(Default)]
    struct RecordingSink {
        log: Vec<(PinId, Level), 32>,
        all_off_calls: usize,
    }

    impl OutputSink for RecordingSink {
        fn write(&mut self, pin: PinId, level: Level) {
            self.log.push((pin, level)).expect("sink log overflow");
        }

        fn all_off(&mut self) {
            self.all_off_calls += 1;
        }
    }

    #[test]
    fn deadline_comparison_is_modular() {
        let before_wrap = Millis::new(u32::MAX - 10);
        let deadline = before_wrap.wrapping_add_ms(20);
        assert_eq!(deadline, Millis::new(9));

        assert!(!before_wrap.has_reached(deadline));
        assert!(Millis::new(9).has_reached(deadline));
        assert!(Millis::new(500).has_reached(deadline));
        assert!(deadline.has_reached(deadline));
    }

    #[test]
    fn pin_display_honors_width_and_alignment() {
        use fmt::Write as _;

        let mut rendered = heapless::String::<16>::new();
        write!(rendered, "[{:<6}]", PinId::new(2)).expect("format fits");
        assert_eq!(rendered.as_str(), "[pin2  ]");
    }

    #[test]
    fn idle_entry_does_not_transition() {
        let mut scheduler: Scheduler<2> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let pin = PinId::new(13);

        scheduler.add(pin, FLASH, Millis::ZERO).expect("table slot");

        assert_eq!(scheduler.tick(Millis::ZERO, &mut sink, &mut recorder), 1);
        assert_eq!(sink.log.as_slice(), &[(pin, Level::High)]);

        // Mid-dwell polls are no-ops.
        assert_eq!(scheduler.tick(Millis::new(50), &mut sink, &mut recorder), 0);
        assert_eq!(sink.log.len(), 1);
    }

    #[test]
    fn steady_on_holds_level_across_refreshes() {
        let mut scheduler: Scheduler<1> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let pin = PinId::new(4);

        scheduler.add(pin, STEADY_ON, Millis::ZERO).expect("table slot");

        let mut now = Millis::ZERO;
        for _ in 0..4 {
            scheduler.tick(now, &mut sink, &mut recorder);
            now = now.wrapping_add_ms(1_000);
        }

        assert!(sink.log.iter().all(|&(_, level)| level == Level::High));
    }

    #[test]
    fn null_slot_parks_the_entry() {
        let mut scheduler: Scheduler<1> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let pin = PinId::new(7);

        scheduler.add(pin, DARK, Millis::ZERO).expect("table slot");

        assert_eq!(scheduler.tick(Millis::ZERO, &mut sink, &mut recorder), 0);
        let entry = scheduler.entry(pin).expect("entry missing");
        assert!(entry.is_parked());
        assert_eq!(
            recorder.latest().map(|record| record.event),
            Some(BlinkEventKind::EntryParked(pin))
        );

        // Parked entries are skipped on subsequent ticks.
        assert_eq!(scheduler.tick(Millis::new(5_000), &mut sink, &mut recorder), 0);
        assert!(recorder.len() == 1);
    }

    #[test]
    fn unresolvable_loop_chain_freezes_only_the_bad_entry() {
        const SPIN_STATES: [StateDef; 2] =
            [StateDef::loop_forever(1), StateDef::loop_forever(0)];
        const SPIN: Pattern = Pattern::new("spin", &SPIN_STATES);

        let mut scheduler: Scheduler<2> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let bad = PinId::new(1);
        let good = PinId::new(2);

        scheduler.add(bad, SPIN, Millis::ZERO).expect("table slot");
        scheduler.add(good, FLASH, Millis::ZERO).expect("table slot");

        assert_eq!(scheduler.tick(Millis::ZERO, &mut sink, &mut recorder), 1);
        assert!(scheduler.entry(bad).expect("bad entry").is_parked());
        assert!(!scheduler.entry(good).expect("good entry").is_parked());
        assert!(recorder.oldest_first().any(|record| {
            record.event == BlinkEventKind::PatternFault(bad, FaultKind::LoopChainUnresolved)
        }));

        // Fault is reported once; the survivor keeps blinking.
        let faults_before = recorder.len();
        assert_eq!(scheduler.tick(Millis::new(100), &mut sink, &mut recorder), 1);
        assert_eq!(
            recorder
                .oldest_first()
                .filter(|record| matches!(record.event, BlinkEventKind::PatternFault(..)))
                .count(),
            1
        );
        assert!(recorder.len() > faults_before);
    }

    #[test]
    fn out_of_range_slot_parks_only_the_bad_entry() {
        // `next` points past the end of the table; `validate` was skipped.
        const WILD_STATES: [StateDef; 1] = [StateDef::drive(Level::High, 100, 9)];
        const WILD: Pattern = Pattern::new("wild", &WILD_STATES);

        let mut scheduler: Scheduler<2> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();
        let bad = PinId::new(5);
        let good = PinId::new(6);

        scheduler.add(bad, WILD, Millis::ZERO).expect("table slot");
        scheduler.add(good, FLASH, Millis::ZERO).expect("table slot");

        // Slot 0 is still well-formed, so the first pass drives both pins.
        assert_eq!(scheduler.tick(Millis::ZERO, &mut sink, &mut recorder), 2);

        // The dangling index is only reached when the dwell expires.
        assert_eq!(scheduler.tick(Millis::new(100), &mut sink, &mut recorder), 1);
        assert!(scheduler.entry(bad).expect("bad entry").is_parked());
        assert!(!scheduler.entry(good).expect("good entry").is_parked());
        assert!(recorder.oldest_first().any(|record| {
            record.event == BlinkEventKind::PatternFault(bad, FaultKind::SlotOutOfRange)
        }));

        // Fault is reported once; the survivor keeps blinking.
        assert_eq!(scheduler.tick(Millis::new(1_000), &mut sink, &mut recorder), 1);
        assert_eq!(
            recorder
                .oldest_first()
                .filter(|record| matches!(record.event, BlinkEventKind::PatternFault(..)))
                .count(),
            1
        );
    }

    #[test]
    fn shutdown_parks_every_entry_and_darkens_the_bank() {
        let mut scheduler: Scheduler<2> = Scheduler::new();
        let mut sink = RecordingSink::default();
        let mut recorder: EventRecorder<8> = EventRecorder::new();

        scheduler
            .add(PinId::new(1), FLASH, Millis::ZERO)
            .expect("table slot");
        scheduler
            .add(PinId::new(2), STEADY_ON, Millis::ZERO)
            .expect("table slot");
        scheduler.tick(Millis::ZERO, &mut sink, &mut recorder);

        scheduler.shutdown(&mut sink);
        assert_eq!(sink.all_off_calls, 1);
        assert!(scheduler.entries().iter().all(LedEntry::is_parked));

        // Parked means parked; nothing fires no matter how far time moves.
        assert_eq!(
            scheduler.tick(Millis::new(10_000), &mut sink, &mut recorder),
            0
        );
    }

    #[test]
    fn table_capacity_is_enforced() {
        let mut scheduler: Scheduler<1> = Scheduler::new();
        scheduler
            .add(PinId::new(1), FLASH, Millis::ZERO)
            .expect("first slot");
        assert_eq!(
            scheduler.add(PinId::new(2), FLASH, Millis::ZERO),
            Err(AddError::TableFull)
        );
    }
}
