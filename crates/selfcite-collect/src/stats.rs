//! Run statistics and summary tables.

use std::time::Duration;

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use selfcite_core::{fmt_num, fmt_rate};

use crate::resolve::Resolution;

/// Counters shared by all pipelines.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Input records (articles, documents, rows)
    pub records: usize,
    pub processed: usize,
    /// Records skipped because retrieval failed
    pub skipped: usize,
    pub references: usize,
    /// Indexed by `Resolution as usize`
    pub resolutions: [usize; 4],
    /// References where any citing author matched
    pub self_citations: usize,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn new(records: usize) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn record_resolution(&mut self, resolution: Resolution) {
        self.references += 1;
        self.resolutions[resolution as usize] += 1;
    }

    pub fn resolved(&self, resolution: Resolution) -> usize {
        self.resolutions[resolution as usize]
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.records += other.records;
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.references += other.references;
        for (a, b) in self.resolutions.iter_mut().zip(other.resolutions) {
            *a += b;
        }
        self.self_citations += other.self_citations;
        self.interrupted |= other.interrupted;
        self.elapsed += other.elapsed;
    }

    /// Format summary table as a string.
    pub fn format_table(&self, title: &str) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
                Cell::new("Rate").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Records"),
            Cell::new(format!("{}/{}", fmt_num(self.processed), fmt_num(self.records))),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Skipped"),
            Cell::new(fmt_num(self.skipped)),
            Cell::new(fmt_rate(self.skipped, self.records)),
        ]);
        if self.references > 0 {
            table.add_row(vec![
                Cell::new("References"),
                Cell::new(fmt_num(self.references)),
                Cell::new(""),
            ]);
            for resolution in Resolution::ALL {
                table.add_row(vec![
                    Cell::new(format!("  {}", resolution.as_str())),
                    Cell::new(fmt_num(self.resolved(resolution))),
                    Cell::new(fmt_rate(self.resolved(resolution), self.references)),
                ]);
            }
            table.add_row(vec![
                Cell::new("Self-citations").fg(Color::Green),
                Cell::new(fmt_num(self.self_citations)).fg(Color::Green),
                Cell::new(fmt_rate(self.self_citations, self.references)).fg(Color::Green),
            ]);
        }
        if self.interrupted {
            table.add_row(vec![
                Cell::new("Interrupted").fg(Color::Yellow),
                Cell::new("yes").fg(Color::Yellow),
                Cell::new(""),
            ]);
        }
        table.add_row(vec![
            Cell::new("Elapsed"),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
            Cell::new(""),
        ]);

        format!("\n{table}")
    }

    /// Log minimal summary (non-TTY mode).
    pub fn log(&self, title: &str) {
        log::info!(
            "{title}: {}/{} records, {} skipped, {} references, {} self-citations{}",
            fmt_num(self.processed),
            fmt_num(self.records),
            fmt_num(self.skipped),
            fmt_num(self.references),
            fmt_num(self.self_citations),
            if self.interrupted { " (interrupted)" } else { "" }
        );
    }

    /// Table on a TTY, one log line otherwise.
    pub fn report(&self, title: &str, is_tty: bool) {
        if is_tty {
            eprintln!("{}", self.format_table(title));
        } else {
            self.log(title);
        }
    }
}
