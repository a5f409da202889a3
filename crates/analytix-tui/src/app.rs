use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use analytix_core::session::slugify;
use analytix_core::{
    AnalysisController, AnalysisMeta, InputFile, KeyValueStore, RunOutcome, RunSnapshot, Session,
};
use analytix_reporting::{ExportFormat, ReportMeta, export_results};

use crate::action::{Action, Provider};
use crate::backend;
use crate::model::analysis::{AnalysisFocus, AnalysisView};
use crate::model::form::LoginForm;
use crate::model::landing::{LandingFocus, LandingState};
use crate::theme::Theme;
use crate::tui_event::BackendEvent;

/// Which screen is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Landing,
    Analysis,
}

/// Transient message shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Main application state.
pub struct App {
    pub screen: Screen,
    pub login: LoginForm,
    pub landing: LandingState,
    pub analysis: AnalysisView,
    /// Latest state published by the controller.
    pub snapshot: RunSnapshot,
    pub notice: Option<Notice>,
    pub tick: usize,
    pub theme: Theme,
    pub should_quit: bool,
    pub show_help: bool,
    session: Session<Arc<dyn KeyValueStore>>,
    controller: AnalysisController,
    export_dir: PathBuf,
    events: mpsc::UnboundedSender<BackendEvent>,
}

impl App {
    pub fn new(
        session: Session<Arc<dyn KeyValueStore>>,
        controller: AnalysisController,
        export_dir: PathBuf,
        events: mpsc::UnboundedSender<BackendEvent>,
    ) -> Self {
        let snapshot = controller.snapshot();
        Self {
            screen: Screen::Login,
            login: LoginForm::default(),
            landing: LandingState::default(),
            analysis: AnalysisView::default(),
            snapshot,
            notice: None,
            tick: 0,
            theme: Theme::hub(),
            should_quit: false,
            show_help: false,
            session,
            controller,
            export_dir,
            events,
        }
    }

    /// Whether keystrokes currently go into a text field.
    pub fn is_editing(&self) -> bool {
        match self.screen {
            Screen::Login => true,
            Screen::Landing => self.landing.focus == LandingFocus::Name,
            Screen::Analysis => self.analysis.focus == AnalysisFocus::Path,
        }
    }

    /// Process a user action and update state. Returns true if the app should quit.
    pub fn update(&mut self, action: Action) -> bool {
        // When help overlay is shown, only allow a few actions through
        if self.show_help {
            match action {
                Action::Quit => self.should_quit = true,
                Action::ToggleHelp | Action::NavigateBack => self.show_help = false,
                Action::Tick => self.tick = self.tick.wrapping_add(1),
                _ => {}
            }
            return self.should_quit;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.show_help = true,
            Action::Tick => self.tick = self.tick.wrapping_add(1),
            Action::Resize(..) | Action::None => {}
            action => {
                // Any keystroke dismisses the previous message.
                self.notice = None;
                match self.screen {
                    Screen::Login => self.update_login(action),
                    Screen::Landing => self.update_landing(action),
                    Screen::Analysis => self.update_analysis(action),
                }
            }
        }
        self.should_quit
    }

    fn update_login(&mut self, action: Action) {
        match action {
            Action::Insert(c) => self.login.focused_mut().insert(c),
            Action::Backspace => self.login.focused_mut().backspace(),
            Action::FocusNext | Action::MoveDown | Action::MoveUp => self.login.cycle_focus(),
            Action::Submit => {
                let result = self
                    .session
                    .login(&self.login.username.value, &self.login.password.value);
                match result {
                    Ok(()) => self.enter_landing(),
                    Err(e) => self.error(format!("Sign-in failed: {e}")),
                }
            }
            Action::ProviderLogin(provider) => self.provider_login(provider),
            Action::NavigateBack => self.should_quit = true,
            _ => {}
        }
    }

    fn provider_login(&mut self, provider: Provider) {
        match self.session.login_with_provider(provider.username()) {
            Ok(()) => self.enter_landing(),
            Err(e) => self.error(format!("Sign-in failed: {e}")),
        }
    }

    fn update_landing(&mut self, action: Action) {
        match self.landing.focus {
            LandingFocus::Name => match action {
                Action::Insert(c) => self.landing.name.insert(c),
                Action::Backspace => self.landing.name.backspace(),
                Action::FocusNext | Action::MoveDown => self.landing.cycle_focus(),
                Action::Submit => self.create_analysis(),
                Action::NavigateBack => self.sign_out(),
                _ => {}
            },
            LandingFocus::Recent => match action {
                Action::MoveDown => self.landing.move_down(),
                Action::MoveUp => self.landing.move_up(),
                Action::FocusNext => self.landing.cycle_focus(),
                Action::Submit => {
                    if let Some(meta) = self.landing.selected().cloned() {
                        self.open_analysis(meta);
                    }
                }
                Action::NavigateBack => self.sign_out(),
                _ => {}
            },
        }
    }

    fn update_analysis(&mut self, action: Action) {
        match self.analysis.focus {
            AnalysisFocus::Path => match action {
                Action::Insert(c) => self.analysis.path.insert(c),
                Action::Backspace => self.analysis.path.backspace(),
                Action::Submit => self.select_file(),
                Action::FocusNext | Action::NavigateBack => self.analysis.cycle_focus(),
                _ => {}
            },
            AnalysisFocus::Controls => match action {
                Action::StartRun | Action::Submit => self.start_run(),
                Action::Reset => self.reset_run(),
                Action::Export => self.export(),
                Action::FocusNext => self.analysis.cycle_focus(),
                Action::NavigateBack => self.enter_landing(),
                _ => {}
            },
        }
    }

    fn enter_landing(&mut self) {
        self.login.password.clear();
        match self.session.overview() {
            Ok(overview) => self.landing.overview = overview,
            Err(e) => self.error(format!("Cannot load overview: {e}")),
        }
        match self.session.recent_analyses() {
            Ok(recent) => self.landing.set_recent(recent),
            Err(e) => self.error(format!("Cannot load recent analyses: {e}")),
        }
        self.landing.focus = LandingFocus::Name;
        self.screen = Screen::Landing;
    }

    fn sign_out(&mut self) {
        self.login = LoginForm::default();
        self.screen = Screen::Login;
    }

    fn create_analysis(&mut self) {
        match self.session.create_analysis(&self.landing.name.value) {
            Ok(meta) => {
                self.landing.name.clear();
                self.open_analysis(meta);
            }
            Err(e) => self.error(format!("Cannot create analysis: {e}")),
        }
    }

    fn open_analysis(&mut self, meta: AnalysisMeta) {
        log::info!("opening analysis {}", meta.id);
        self.controller.reset();
        self.snapshot = self.controller.snapshot();
        self.analysis = AnalysisView::new(meta.name);
        self.screen = Screen::Analysis;
    }

    fn select_file(&mut self) {
        let raw = self.analysis.path.value.trim().to_string();
        if raw.is_empty() {
            return;
        }
        match InputFile::from_path(Path::new(&raw)) {
            Ok(input) => {
                let text = format!("Selected {} ({} KB)", input.name, input.size_kb());
                self.controller.select_input(input);
                self.snapshot = self.controller.snapshot();
                self.analysis.focus = AnalysisFocus::Controls;
                self.info(text);
            }
            Err(e) => self.error(format!("{e:#}")),
        }
    }

    fn start_run(&mut self) {
        match self.controller.start() {
            Ok(handle) => {
                self.snapshot = self.controller.snapshot();
                backend::watch_run(handle, self.events.clone());
            }
            Err(e) => self.error(format!("Cannot start: {e}")),
        }
    }

    fn reset_run(&mut self) {
        self.controller.reset();
        self.snapshot = self.controller.snapshot();
        self.analysis.path.clear();
        self.info("Reset".to_string());
    }

    fn export(&mut self) {
        let stem = match slugify(&self.analysis.name) {
            s if s.is_empty() => "analysis".to_string(),
            s => s,
        };
        let path = self
            .export_dir
            .join(format!("{stem}.{}", ExportFormat::Html.extension()));
        let results = self.controller.snapshot().results;
        let meta = ReportMeta::new(&self.analysis.name);
        match export_results(ExportFormat::Html, &meta, &results, &path) {
            Ok(()) => self.info(format!("Exported to {}", path.display())),
            Err(e) => self.error(format!("Export failed: {e}")),
        }
    }

    fn info(&mut self, text: String) {
        self.notice = Some(Notice {
            text,
            is_error: false,
        });
    }

    fn error(&mut self, text: String) {
        log::warn!("{text}");
        self.notice = Some(Notice {
            text,
            is_error: true,
        });
    }

    /// Process a backend event and update model state.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Snapshot(snapshot) => self.snapshot = snapshot,
            BackendEvent::RunFinished {
                generation,
                outcome,
            } => match outcome {
                Ok(RunOutcome::Completed(record)) => {
                    self.info(format!("Analysis complete: {}", record.file_name));
                }
                Ok(RunOutcome::Superseded) => {
                    log::debug!("run {generation} superseded");
                }
                Err(e) => self.error(format!("Run {generation} failed: {e}")),
            },
        }
    }

    /// Render the current screen.
    pub fn view(&self, f: &mut ratatui::Frame) {
        match self.screen {
            Screen::Login => crate::view::login::render(f, self),
            Screen::Landing => crate::view::landing::render(f, self),
            Screen::Analysis => crate::view::analysis::render(f, self),
        }

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }
}
