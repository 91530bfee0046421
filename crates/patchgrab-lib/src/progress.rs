//! Per-item status events and the console line that renders them.

use crate::download::DownloadItem;
use console::{StyledObject, Term, style};
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub enum TransferEvent {
    Checking,
    Skipping,
    Oversize,
    Download { downloaded: u64, total: u64 },
    Retrying,
    Complete,
    Error(String),
}

impl TransferEvent {
    pub fn tag(&self) -> &'static str {
        match self {
            TransferEvent::Checking => "CHECKING",
            TransferEvent::Skipping => "SKIPPING",
            TransferEvent::Oversize => "OVERSIZE",
            TransferEvent::Download { .. } => "DOWNLOAD",
            TransferEvent::Retrying => "RETRYING",
            TransferEvent::Complete => "COMPLETE",
            TransferEvent::Error(_) => "ERROR",
        }
    }

    /// Whether the status line for this item is finished.
    pub fn ends_line(&self) -> bool {
        matches!(
            self,
            TransferEvent::Skipping
                | TransferEvent::Retrying
                | TransferEvent::Complete
                | TransferEvent::Error(_)
        )
    }

    fn detail(&self) -> Option<String> {
        match self {
            TransferEvent::Download { downloaded, total } => Some(format!(
                "- {:.2}% ({} of {})",
                percent(*downloaded, *total),
                format_bytes(*downloaded),
                format_bytes(*total)
            )),
            TransferEvent::Error(message) => Some(message.clone()),
            _ => None,
        }
    }

    fn styled_tag(&self) -> StyledObject<String> {
        let tag = style(format!("[{}]", self.tag()));
        match self {
            TransferEvent::Checking => tag.magenta(),
            TransferEvent::Skipping => tag.yellow(),
            TransferEvent::Download { .. } => tag.blue(),
            TransferEvent::Complete => tag.green(),
            TransferEvent::Oversize | TransferEvent::Retrying | TransferEvent::Error(_) => {
                tag.red()
            }
        }
    }
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tag())?;
        if let Some(detail) = self.detail() {
            write!(f, " {}", detail)?;
        }
        Ok(())
    }
}

pub fn percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * downloaded as f64 / total as f64
}

/// Human-readable size in powers of 1024 with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["b", "kB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 b".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

pub trait ProgressReporter {
    fn report(&self, item: &DownloadItem, event: &TransferEvent);
}

/// Decides which events are worth a line of their own when output is not a terminal.
///
/// Every tagged state passes. DOWNLOAD passes only when the whole percentage changes,
/// so a large body does not print one line per received chunk.
#[derive(Debug, Default)]
pub struct LineThrottle {
    last_percent: Mutex<Option<u64>>,
}

impl LineThrottle {
    pub fn admits(&self, event: &TransferEvent) -> bool {
        let mut last_percent = self
            .last_percent
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match event {
            TransferEvent::Download { downloaded, total } => {
                let whole = percent(*downloaded, *total).floor() as u64;
                if *last_percent == Some(whole) {
                    return false;
                }
                *last_percent = Some(whole);
                true
            }
            _ => {
                *last_percent = None;
                true
            }
        }
    }
}

/// Draws one overwritten status line per item.
pub struct ConsoleReporter {
    term: Term,
    throttle: LineThrottle,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
            throttle: LineThrottle::default(),
        }
    }

    fn draw(&self, item: &DownloadItem, event: &TransferEvent) -> std::io::Result<()> {
        let mut line = format!(
            "{} {}",
            style(format!("[{}]", item.version)).yellow(),
            event.styled_tag()
        );
        if let Some(detail) = event.detail() {
            line.push(' ');
            line.push_str(&detail);
        }

        // Without a terminal there is no cursor to rewind, so lines are appended.
        if !self.term.is_term() {
            if !self.throttle.admits(event) {
                return Ok(());
            }
            return self.term.write_line(&line);
        }

        self.term.clear_line()?;
        self.term.write_str(&line)?;
        if event.ends_line() {
            self.term.write_line("")?;
        }
        Ok(())
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, item: &DownloadItem, event: &TransferEvent) {
        if let Err(err) = self.draw(item, event) {
            tracing::debug!("Failed to draw status line: {}", err);
        }
    }
}
