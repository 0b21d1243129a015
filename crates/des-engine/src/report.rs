//! Process statistics tables.
//!
//! Formatting is separated from printing so tests (and embedding programs
//! that want the table somewhere other than stdout) can work with the
//! string.

use std::fmt::Write;

use crate::Environment;

impl Environment {
    /// Print one row per process, in registration order.
    pub fn print_process_statistics(&self) {
        print!("{}", self.process_statistics_table(None));
    }

    /// Print only the processes tagged with `group`.
    pub fn print_process_group_statistics(&self, group: &str) {
        print!("{}", self.process_statistics_table(Some(group)));
    }

    /// The statistics table as a string; `filter` restricts rows to
    /// processes carrying that group tag.
    pub fn process_statistics_table(&self, filter: Option<&str>) -> String {
        let mut out = String::new();
        match filter {
            Some(group) => {
                let _ = writeln!(out, "[PROCESS STATISTICS] Group: {group}");
            }
            None => {
                let _ = writeln!(out, "[PROCESS STATISTICS]");
            }
        }
        let _ = writeln!(
            out,
            "{:>24}{:>16}{:>16}{:>16}",
            "Process", "Entities In", "Entities Out", "Avg Q Time (s)"
        );
        for process in self.processes() {
            if let Some(group) = filter {
                if !process.has_group(group) {
                    continue;
                }
            }
            let stats = process.stats();
            let _ = writeln!(
                out,
                "{:>24.24}{:>16}{:>16}{:>16.2}",
                process.id(),
                stats.entered,
                stats.exited,
                stats.mean_wait
            );
        }
        out
    }
}
