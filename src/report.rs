use crate::{error::Error, vars::PROGRESS_GLYPHS};
use log::{error, info};

const COMPLETED: char = '▪';
const REMAINING: char = '▫';

/// status line and progress bar shown to the user, mirrored to the log
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    status: String,
    bad: bool,
    bar: String,
    completions: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_line(&self) -> &str {
        &self.status
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    pub fn bar(&self) -> &str {
        &self.bar
    }

    /// how many tasks have reported full progress
    pub fn completions(&self) -> usize {
        self.completions
    }

    /// errors stay until reset
    pub fn status(&mut self, message: &str) {
        if !self.bad && self.status != message {
            if !message.is_empty() {
                info!("{}", message);
            }
            self.status = message.to_string();
        }
    }

    pub fn error(&mut self, err: &Error) {
        error!("{}", err);
        self.status = err.status();
        self.bad = true;
    }

    pub fn reset(&mut self) {
        self.status.clear();
        self.bad = false;
    }

    /// amount in [0, 1), anything else hides the bar
    pub fn progress(&mut self, amount: f64) {
        if (0.0..1.0).contains(&amount) {
            let done = ((amount * PROGRESS_GLYPHS as f64).ceil() as usize).min(PROGRESS_GLYPHS);
            self.bar = std::iter::repeat(COMPLETED)
                .take(done)
                .chain(std::iter::repeat(REMAINING).take(PROGRESS_GLYPHS - done))
                .collect();
        } else {
            self.bar.clear();
            self.completions += 1;
        }
    }

    /// drop the bar of a task that will never finish
    pub fn hide_progress(&mut self) {
        self.bar.clear();
    }
}
