//! Terminal stand-ins for the browser's toast widget and `confirm()`.

use std::io::{self, BufRead, Write};

use bz_core::{Dialogs, Level, Notifier};

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        tracing::debug!(?level, message, "notification");
        let tag = match level {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }
}

/// Asks on stdin unless `assume_yes` is set. Anything but `y`/`yes` declines.
pub struct ConsoleDialogs {
    pub assume_yes: bool,
}

impl Dialogs for ConsoleDialogs {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                tracing::warn!(error = %err, "confirmation not read");
                false
            }
        }
    }
}
