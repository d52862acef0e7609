use std::collections::BTreeMap;
use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::style::Stylize;

use blink_core::pattern::presets::{BURST, FAST_BLINK, FLASH, SLOW_BLINK, STEADY_ON};
use blink_core::pattern::{Level, Pattern};
use blink_core::scheduler::{MAX_LEDS, Millis, OutputSink, PinId, Scheduler};
use blink_core::telemetry::EventRecorder;

/// Ring capacity for the session's event recorder.
const EVENT_CAPACITY: usize = 64;

/// Largest simulated interval a single `run` command may cover.
const MAX_RUN_MS: u32 = 60_000;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "step",
        "step <ms>    - jump the clock forward and poll the scheduler once",
    ),
    (
        "run",
        "run <ms>     - poll the scheduler once per simulated millisecond",
    ),
    ("show", "show         - display the LED bank and entry state"),
    ("off", "off          - park every device and force the bank dark"),
    ("events", "events       - dump the recorded scheduler events"),
    ("help", "help [topic] - show help for a command"),
];

/// Preset LED bank loaded at startup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BankProfile {
    Blink,
    Burst,
    Demo,
}

impl BankProfile {
    pub fn header(self) -> &'static str {
        match self {
            BankProfile::Blink => "Blink bank emulator",
            BankProfile::Burst => "Burst bank emulator",
            BankProfile::Demo => "Demo bank emulator",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        if tag.eq_ignore_ascii_case("blink") {
            Ok(Self::Blink)
        } else if tag.eq_ignore_ascii_case("burst") {
            Ok(Self::Burst)
        } else if tag.eq_ignore_ascii_case("demo") {
            Ok(Self::Demo)
        } else {
            Err(format!("Unknown bank profile `{tag}`"))
        }
    }

    /// Pin assignments and pattern tables for this profile.
    fn bank(self) -> Vec<(PinId, Pattern)> {
        match self {
            BankProfile::Blink => vec![
                (PinId::new(2), SLOW_BLINK),
                (PinId::new(3), FAST_BLINK),
                (PinId::new(4), FLASH),
            ],
            BankProfile::Burst => vec![(PinId::new(2), BURST), (PinId::new(3), FLASH)],
            BankProfile::Demo => vec![
                (PinId::new(2), SLOW_BLINK),
                (PinId::new(3), FAST_BLINK),
                (PinId::new(4), FLASH),
                (PinId::new(5), BURST),
                (PinId::new(6), STEADY_ON),
            ],
        }
    }
}

/// Output sink that tracks the last level driven onto each pin.
#[derive(Default)]
struct LevelBoard {
    levels: BTreeMap<u8, Level>,
}

impl LevelBoard {
    fn level_of(&self, pin: PinId) -> Option<Level> {
        self.levels.get(&pin.as_u8()).copied()
    }
}

impl OutputSink for LevelBoard {
    fn write(&mut self, pin: PinId, level: Level) {
        self.levels.insert(pin.as_u8(), level);
    }

    fn all_off(&mut self) {
        for level in self.levels.values_mut() {
            *level = Level::Low;
        }
    }
}

pub struct Session {
    profile: BankProfile,
    scheduler: Scheduler<MAX_LEDS>,
    board: LevelBoard,
    recorder: EventRecorder<EVENT_CAPACITY>,
    clock: Millis,
    use_color: bool,
}

impl Session {
    pub fn new(profile: BankProfile) -> Self {
        let mut scheduler = Scheduler::new();
        for (pin, pattern) in profile.bank() {
            pattern.validate().expect("preset table must validate");
            scheduler
                .add(pin, pattern, Millis::ZERO)
                .expect("bank fits the device table");
        }

        let mut session = Self {
            profile,
            scheduler,
            board: LevelBoard::default(),
            recorder: EventRecorder::new(),
            clock: Millis::ZERO,
            use_color: io::stdout().is_terminal(),
        };

        // Arm every entry's first dwell so `show` reflects t=0 levels.
        session.tick();
        session
    }

    /// Drives the interactive loop until `exit`, `quit`, or end of input.
    pub fn repl<R, W>(&mut self, mut input: R, mut output: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        writeln!(
            output,
            "{} ready. Type `help` for commands or `exit` to quit.",
            self.profile.header()
        )?;

        let mut line = String::new();
        loop {
            line.clear();
            write!(output, "> ")?;
            output.flush()?;

            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                writeln!(output, "Session closed.")?;
                return Ok(());
            }

            for response in self.handle_command(trimmed) {
                writeln!(output, "{response}")?;
            }
        }
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if trimmed.eq_ignore_ascii_case("help") {
            return self.handle_help(None);
        }
        if let Some(rest) = trimmed.strip_prefix("help ") {
            return self.handle_help(Some(rest.trim()));
        }
        if trimmed.eq_ignore_ascii_case("show") {
            return self.render_bank();
        }
        if trimmed.eq_ignore_ascii_case("off") {
            return self.handle_off();
        }
        if trimmed.eq_ignore_ascii_case("events") {
            return self.render_events();
        }
        if let Some(rest) = trimmed.strip_prefix("step ") {
            return match parse_interval(rest) {
                Ok(ms) => self.handle_step(ms),
                Err(err) => vec![err],
            };
        }
        if let Some(rest) = trimmed.strip_prefix("run ") {
            return match parse_interval(rest) {
                Ok(ms) => self.handle_run(ms),
                Err(err) => vec![err],
            };
        }

        vec![format!(
            "ERR unknown command `{trimmed}`; type `help` for a list"
        )]
    }

    fn handle_help(&self, topic: Option<&str>) -> Vec<String> {
        match topic {
            None => HELP_TOPICS
                .iter()
                .map(|(_, usage)| (*usage).to_string())
                .collect(),
            Some(topic) => HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(topic))
                .map_or_else(
                    || vec![format!("ERR no help for `{topic}`")],
                    |(_, usage)| vec![(*usage).to_string()],
                ),
        }
    }

    /// Jumps the clock forward and polls once, like a control loop that was
    /// busy elsewhere for `ms` milliseconds.
    fn handle_step(&mut self, ms: u32) -> Vec<String> {
        self.clock = self.clock.wrapping_add_ms(ms);
        let writes = self.tick();
        vec![format!("t={} writes={writes}", self.clock.as_u32())]
    }

    /// Polls once per simulated millisecond, the cooperative control loop
    /// the scheduler is designed around.
    fn handle_run(&mut self, ms: u32) -> Vec<String> {
        if ms > MAX_RUN_MS {
            return vec![format!("ERR run interval exceeds {MAX_RUN_MS} ms")];
        }

        let mut writes = 0;
        for _ in 0..ms {
            self.clock = self.clock.wrapping_add_ms(1);
            writes += self.tick();
        }
        vec![format!("t={} writes={writes}", self.clock.as_u32())]
    }

    /// Parks the whole bank and drops every tracked level to low.
    fn handle_off(&mut self) -> Vec<String> {
        self.scheduler.shutdown(&mut self.board);
        vec![format!(
            "t={} bank off; all devices parked",
            self.clock.as_u32()
        )]
    }

    fn tick(&mut self) -> usize {
        self.scheduler
            .tick(self.clock, &mut self.board, &mut self.recorder)
    }

    fn render_bank(&self) -> Vec<String> {
        let mut lines = vec![format!("t={}", self.clock.as_u32())];
        for entry in self.scheduler.entries() {
            let pin = entry.pin();
            let level = self.board.level_of(pin);
            let lamp = self.render_lamp(level, entry.is_parked());
            let status = if entry.is_parked() {
                "parked".to_string()
            } else {
                match entry.wakeup() {
                    Some(wakeup) => format!("next wakeup t={}", wakeup.as_u32()),
                    None => "idle".to_string(),
                }
            };
            lines.push(format!(
                "{lamp} {pin:<6} {:<12} {status}",
                entry.pattern().name()
            ));
        }
        lines
    }

    fn render_lamp(&self, level: Option<Level>, parked: bool) -> String {
        let lamp = match (parked, level) {
            (true, _) => "x",
            (false, Some(Level::High)) => "●",
            (false, Some(Level::Low) | None) => "○",
        };
        if !self.use_color {
            return lamp.to_string();
        }
        match (parked, level) {
            (true, _) => lamp.red().to_string(),
            (false, Some(Level::High)) => lamp.green().to_string(),
            (false, Some(Level::Low) | None) => lamp.dark_grey().to_string(),
        }
    }

    fn render_events(&self) -> Vec<String> {
        if self.recorder.is_empty() {
            return vec!["no events recorded".to_string()];
        }
        self.recorder
            .oldest_first()
            .map(|record| format!("#{} t={} {}", record.id, record.at.as_u32(), record.event))
            .collect()
    }
}

fn parse_interval(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    raw.parse::<u32>()
        .map_err(|_| format!("ERR expected a millisecond count, got `{raw}`"))
}
