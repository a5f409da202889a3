use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::action::{Action, Provider};

/// Map a crossterm terminal event to a TUI action.
///
/// While a text field has focus (`editing`), printable keys are inserted
/// instead of being treated as shortcuts.
pub fn map_event(event: &Event, editing: bool) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, editing),
        Event::Resize(w, h) => Action::Resize(*w, *h),
        _ => Action::None,
    }
}

fn map_key(key: &KeyEvent, editing: bool) -> Action {
    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Enter => Action::Submit,
        KeyCode::Esc => Action::NavigateBack,
        KeyCode::Tab | KeyCode::BackTab => Action::FocusNext,
        KeyCode::Up => Action::MoveUp,
        KeyCode::Down => Action::MoveDown,
        KeyCode::F(2) => Action::ProviderLogin(Provider::Google),
        KeyCode::F(3) => Action::ProviderLogin(Provider::GitHub),
        KeyCode::Backspace if editing => Action::Backspace,
        KeyCode::Char(c) if editing => Action::Insert(c),
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Char('s') => Action::StartRun,
        KeyCode::Char('r') => Action::Reset,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('?') => Action::ToggleHelp,
        _ => Action::None,
    }
}
