//! One progress bar per download job.
//!
//! Presentation only: snapshots come in from the handler's channel and are
//! drawn as they arrive. Bars draw to stderr and stay hidden when it is not
//! a terminal; the handler prints a summary line per job either way.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use yoink_core::{DownloadProgress, DownloadStatus, JobId};

use super::media::summary_line;

const MAX_LABEL: usize = 40;

/// Bars for every job of a batch.
pub struct JobBoard {
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
}

impl JobBoard {
    /// Create an empty board drawing to stderr.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            bars: HashMap::new(),
        }
    }

    /// Add a bar for a queued job.
    pub fn add(&mut self, id: &JobId, label: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(bar_style());
        bar.set_prefix(DownloadStatus::Queued.as_str());
        bar.set_message(format_label(label));
        bar.enable_steady_tick(Duration::from_millis(250));
        self.bars.insert(id.clone(), bar);
    }

    /// Redraw a job's bar from its latest snapshot.
    pub fn update(&self, progress: &DownloadProgress) {
        let Some(bar) = self.bars.get(&progress.id) else {
            return;
        };
        bar.set_prefix(progress.status.as_str());
        bar.set_position(percent_position(progress.percent));

        let mut message = format_label(&progress.title);
        for extra in [progress.speed_display(), progress.eta_display()] {
            if !extra.is_empty() {
                message.push_str("  ");
                message.push_str(&extra);
            }
        }
        bar.set_message(message);
    }

    /// Replace a job's bar with its outcome line.
    pub fn finish(&self, progress: &DownloadProgress) {
        if let Some(bar) = self.bars.get(&progress.id) {
            bar.finish_and_clear();
        }
        self.println(&summary_line(progress));
    }

    /// Print a line above the bars.
    pub fn println(&self, line: &str) {
        if self.multi.is_hidden() || self.multi.println(line).is_err() {
            eprintln!("{line}");
        }
    }
}

impl Default for JobBoard {
    fn default() -> Self {
        Self::new()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>11} {bar:28.cyan/blue} {pos:>3}%  {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_position(percent: f64) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}

fn format_label(raw: &str) -> String {
    let label = if raw.is_empty() { "resolving…" } else { raw };
    if label.chars().count() <= MAX_LABEL {
        return label.to_string();
    }
    let mut buf: String = label.chars().take(MAX_LABEL - 1).collect();
    buf.push('…');
    buf
}
