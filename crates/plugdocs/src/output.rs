//! Colored terminal output on stderr.

use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    heading: Style,
    label: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            heading: Style::new().cyan().bold(),
            label: Style::new().dim(),
        }
    }

    fn line(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// `label: value` with a dimmed label.
    pub(crate) fn field(&self, label: &str, value: impl std::fmt::Display) {
        self.line(&format!("  {} {value}", self.label.apply_to(format!("{label}:"))));
    }

    pub(crate) fn heading(&self, msg: &str) {
        self.line(&self.heading.apply_to(msg).to_string());
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.green.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.yellow.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.red.apply_to(msg).to_string());
    }
}
