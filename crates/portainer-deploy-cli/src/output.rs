//! Colored console messages.

use std::fmt::Display;

use crossterm::style::Stylize;

pub(crate) fn info(message: impl Display) {
    println!("{}", message.to_string().white());
}

pub(crate) fn success(message: impl Display) {
    println!("{}", message.to_string().green());
}

pub(crate) fn warn(message: impl Display) {
    println!("{}", message.to_string().yellow());
}

pub(crate) fn error(message: impl Display) {
    eprintln!("{}", message.to_string().on_red());
}

/// Prints each pipeline step as it happens and keeps a transcript.
#[derive(Debug, Default)]
pub(crate) struct Progress {
    steps: Vec<String>,
}

impl Progress {
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info(&message);
        self.steps.push(message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        success(&message);
        self.steps.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn(&message);
        self.steps.push(message);
    }

    pub fn into_steps(self) -> Vec<String> {
        self.steps
    }
}
