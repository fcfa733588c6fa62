// UI layer: terminal prompts with `dialoguer` and a spinner around the slow
// movie lookup. The menu logic itself lives in `dispatcher`; this module
// only connects it to a real terminal.

use crate::api::{LookupError, MovieLookup};
use crate::catalog::Record;
use crate::dispatcher::{Dispatcher, Prompt};
use anyhow::{Context, Result};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::io;
use std::time::Duration;

/// Reads answers from the terminal. Empty answers are allowed so handlers
/// can decide what an empty title or rating means.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&mut self, label: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("failed to read '{}' from the terminal", label))
    }
}

/// Wraps a lookup so the user sees a spinner while it runs.
pub struct SpinnerLookup<L> {
    inner: L,
}

impl<L: MovieLookup> SpinnerLookup<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: MovieLookup> MovieLookup for SpinnerLookup<L> {
    fn lookup(&self, title: &str) -> Result<Record, LookupError> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Looking up '{}'...", title));
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = self.inner.lookup(title);
        spinner.finish_and_clear();
        result
    }
}

/// Main interactive menu. Blocks until the user picks "Exit".
pub fn main_menu<R: Rng>(mut dispatcher: Dispatcher<'_, R>) -> Result<()> {
    let mut prompt = TerminalPrompt;
    let mut stdout = io::stdout();
    dispatcher.run(&mut prompt, &mut stdout)
}
