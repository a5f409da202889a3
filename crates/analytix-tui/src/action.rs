/// Third-party login buttons on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    pub fn username(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }
}

/// Actions that the TUI can process, mapped from keyboard input or internal events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NavigateBack,
    Submit,
    FocusNext,
    Insert(char),
    Backspace,
    MoveUp,
    MoveDown,
    StartRun,
    Reset,
    Export,
    ProviderLogin(Provider),
    ToggleHelp,
    Tick,
    Resize(u16, u16),
    None,
}
