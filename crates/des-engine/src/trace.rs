//! Console output for a run: banners, per-event trace, progress bar,
//! step-through prompt.
//!
//! Three levels:
//!
//! | Level      | Output                                                  |
//! |------------|---------------------------------------------------------|
//! | `Silent`   | nothing                                                 |
//! | `Progress` | start/end banners + a progress bar (≤ ~15 redraws/s)    |
//! | `Trace`    | every clock tick, generation, admission and completion  |
//!
//! Step-through mode forces `Trace` and blocks for one line of stdin
//! between clock advances.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use des_core::SimTime;

// ── ANSI escapes ──────────────────────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";

// ── LogLevel ──────────────────────────────────────────────────────────────────

/// Verbosity of a run, ordered `Silent < Progress < Trace`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    Silent,
    Progress,
    Trace,
}

// ── RunTrace ──────────────────────────────────────────────────────────────────

const BAR_WIDTH: usize = 40;
const REDRAW_INTERVAL_SECS: f64 = 1.0 / 15.0;

/// Per-run console state.  Created by `Environment::run` and threaded
/// through the loop; wall timing uses `Instant` so simulated time never
/// leaks into the banners.
pub(crate) struct RunTrace {
    level:        LogLevel,
    step_through: bool,
    run_started:  Instant,
    last_redraw:  Instant,
}

impl RunTrace {
    pub(crate) fn new(level: LogLevel, step_through: bool) -> RunTrace {
        let now = Instant::now();
        RunTrace {
            level,
            step_through,
            run_started: now,
            last_redraw: now,
        }
    }

    pub(crate) fn start_banner(&self, end_time: SimTime) {
        if self.level >= LogLevel::Progress {
            println!("[STARTING SIMULATION]");
            println!("[MAX TIME] {}", end_time.human());
        }
    }

    pub(crate) fn end_banner(&self) {
        if self.level >= LogLevel::Progress {
            println!();
            println!("[SIMULATION ENDED]");
            println!("[RUN TIME] {:.2}s", self.run_started.elapsed().as_secs_f64());
            println!();
        }
    }

    pub(crate) fn clock(&self, now: SimTime) {
        if self.level >= LogLevel::Trace {
            println!(
                "{GREEN}{BOLD}[SIMULATION CLOCK] {} ({}){RESET}",
                now.human(),
                now
            );
        }
    }

    pub(crate) fn generated(&self, source: &str, entity: &str) {
        if self.level >= LogLevel::Trace {
            println!("[NEW ENTITY] {source} | {entity}");
        }
    }

    pub(crate) fn process_started(&self, process: &str, entity: &str) {
        if self.level >= LogLevel::Trace {
            println!("[PROCESS STARTED] {process} | {entity}");
        }
    }

    pub(crate) fn process_ended(&self, process: &str, entity: &str) {
        if self.level >= LogLevel::Trace {
            println!("[PROCESS ENDED] {process} | {entity}");
        }
    }

    /// Called after every clock advance: step-through prompt, progress bar,
    /// or a blank separator line, depending on mode.
    pub(crate) fn tick_end(&mut self, now: SimTime, end_time: SimTime) {
        if self.step_through {
            wait_for_enter();
        } else if self.level == LogLevel::Progress {
            self.redraw_progress(now, end_time);
        } else if self.level == LogLevel::Trace {
            println!();
        }
    }

    fn redraw_progress(&mut self, now: SimTime, end_time: SimTime) {
        if self.last_redraw.elapsed().as_secs_f64() < REDRAW_INTERVAL_SECS {
            return;
        }
        self.last_redraw = Instant::now();

        let progress = if end_time.secs() > 0.0 {
            (now.secs() / end_time.secs()).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let filled = (progress * BAR_WIDTH as f64).ceil() as usize;
        print!(
            "\r[{}{}]",
            "\u{25A0}".repeat(filled),
            " ".repeat(BAR_WIDTH - filled)
        );
        let _ = io::stdout().flush();
    }
}

/// Block until the operator presses ENTER.
fn wait_for_enter() {
    println!("{BOLD}[STEP THROUGH] Press ENTER to continue{BOLD_OFF}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
