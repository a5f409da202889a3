use super::form::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisFocus {
    /// Typing a file path.
    #[default]
    Path,
    /// Single-key shortcuts (start, reset, export).
    Controls,
}

/// Analysis screen state not owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct AnalysisView {
    pub name: String,
    pub path: TextField,
    pub focus: AnalysisFocus,
}

impl AnalysisView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            AnalysisFocus::Path => AnalysisFocus::Controls,
            AnalysisFocus::Controls => AnalysisFocus::Path,
        };
    }
}
