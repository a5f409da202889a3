use analytix_core::{AnalysisMeta, Overview};

use super::form::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LandingFocus {
    #[default]
    Name,
    Recent,
}

/// Landing screen state: create field, usage overview, recent analyses.
#[derive(Debug, Clone, Default)]
pub struct LandingState {
    pub name: TextField,
    pub focus: LandingFocus,
    pub overview: Overview,
    pub recent: Vec<AnalysisMeta>,
    pub cursor: usize,
}

impl LandingState {
    pub fn set_recent(&mut self, recent: Vec<AnalysisMeta>) {
        self.cursor = self.cursor.min(recent.len().saturating_sub(1));
        self.recent = recent;
    }

    pub fn selected(&self) -> Option<&AnalysisMeta> {
        self.recent.get(self.cursor)
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.recent.len() {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Toggle between the name field and the list; the list is skipped when empty.
    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            LandingFocus::Name if !self.recent.is_empty() => LandingFocus::Recent,
            _ => LandingFocus::Name,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> AnalysisMeta {
        AnalysisMeta {
            id: format!("{name}-0000"),
            name: name.to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut state = LandingState::default();
        state.set_recent(vec![meta("a"), meta("b")]);
        state.move_down();
        state.move_down();
        assert_eq!(state.cursor, 1);
        state.set_recent(vec![meta("c")]);
        assert_eq!(state.cursor, 0);
        state.move_up();
        assert_eq!(state.selected().map(|m| m.name.as_str()), Some("c"));
    }

    #[test]
    fn focus_skips_empty_list() {
        let mut state = LandingState::default();
        state.cycle_focus();
        assert_eq!(state.focus, LandingFocus::Name);
        state.set_recent(vec![meta("a")]);
        state.cycle_focus();
        assert_eq!(state.focus, LandingFocus::Recent);
        state.cycle_focus();
        assert_eq!(state.focus, LandingFocus::Name);
    }
}
