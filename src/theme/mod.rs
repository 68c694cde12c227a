//! Theme for human-mode output.

use console::Style;

use crate::record::{Priority, Status};

/// Styles for human-mode output, in one place.
pub struct SnagTheme {
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,
    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub id: Style,
}

impl Default for SnagTheme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            muted: Style::new().dim(),
            header: Style::new().blue().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            id: Style::new().yellow(),
        }
    }
}

impl SnagTheme {
    pub fn priority(&self, priority: Priority) -> Style {
        match priority {
            Priority::Low => Style::new().dim(),
            Priority::Medium => Style::new().yellow(),
            Priority::High => Style::new().red().bold(),
        }
    }

    pub fn status(&self, status: Status) -> Style {
        match status {
            Status::Open => Style::new().cyan(),
            Status::InProgress => Style::new().magenta(),
            Status::Closed => self.success.clone(),
        }
    }
}
