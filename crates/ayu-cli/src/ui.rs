//! Screen flow and terminal loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ayu_api::{AppointmentDetails, BookingRequest, FieldDescriptor, FieldType, IntakeClient};
use ayu_intake::{
    DemoEvent, HttpIntakeService, IntakeEvent, IntakeMachine, Language, Message, MessageKind,
    PatientSession, Phase, Role, Scenario, ScriptLine, ScriptedSequencer, SpeechPlayer,
    SpeechSynth, TokioClock, builtin_scenarios,
};
use ayu_tui::{
    Theme,
    input::{Action, key_to_action},
    widgets::{
        ActivityStrip, ChatBubble, InputBar, InputMode, MessageList, OptionChips,
        ThinkingIndicator,
    },
};
use chrono::TimeZone;

use crate::report::{CONFIRMATION_VOICE, REVIEW_GREETING, confirmation_lines, report_lines};
use crate::runner::{
    UiEvent, UserAction, spawn_booking, spawn_conversation, spawn_demo, spawn_speech,
};
use crate::store::{ResultStore, StoredResult};

/// Which view is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Language,
    Intake,
    Report,
    Confirmed,
    DemoPicker,
    Demo,
}

#[derive(Debug, Clone)]
enum BookingState {
    Idle,
    InFlight,
    Failed(String),
}

/// Flow-level commands returned by the state for the run loop to execute
enum FlowCmd {
    Quit,
    StartConversation(Language),
    Forward(UserAction),
    Book,
    StartDemo(usize),
    StopDemo,
    Speak(&'static str),
}

/// All presentation state for the client
struct UiState {
    theme: Theme,
    screen: Screen,
    session: PatientSession,
    player: Arc<dyn SpeechPlayer>,

    // language picker
    language_idx: usize,

    // intake conversation
    bubbles: Vec<ChatBubble>,
    input: InputBar,
    chips: OptionChips,
    field: Option<FieldDescriptor>,
    waiting: bool,
    banner: Option<String>,
    scroll: usize,
    spinner_start: Instant,

    // report review
    result: Option<StoredResult>,
    booking: BookingState,
    report_scroll: u16,

    // confirmation
    details: Option<AppointmentDetails>,
    fallback_id: String,

    // demo playback
    scenarios: Vec<Scenario>,
    scenario_idx: usize,
    demo_bubbles: Vec<ChatBubble>,
    demo_phase: Phase,
    demo_running: bool,
}

impl UiState {
    fn new(language: Language, player: Arc<dyn SpeechPlayer>) -> Self {
        let mut input = InputBar::new();
        input.set_placeholder("Type your symptoms or health query...");
        Self {
            theme: Theme::default(),
            screen: Screen::Language,
            session: PatientSession::new(language),
            player,
            language_idx: Language::ALL
                .iter()
                .position(|l| *l == language)
                .unwrap_or(0),
            bubbles: Vec::new(),
            input,
            chips: OptionChips::default(),
            field: None,
            waiting: false,
            banner: None,
            scroll: 0,
            spinner_start: Instant::now(),
            result: None,
            booking: BookingState::Idle,
            report_scroll: 0,
            details: None,
            fallback_id: String::new(),
            scenarios: builtin_scenarios(),
            scenario_idx: 0,
            demo_bubbles: Vec::new(),
            demo_phase: Phase::Listening,
            demo_running: false,
        }
    }

    /// Reset conversation state and show the intake screen
    fn begin_intake(&mut self, language: Language) {
        self.session.set_language(language);
        self.bubbles.clear();
        self.chips.clear();
        self.field = None;
        self.waiting = true;
        self.banner = None;
        self.scroll = 0;
        self.input.clear();
        self.spinner_start = Instant::now();
        self.screen = Screen::Intake;
        self.sync_input();
    }

    fn begin_demo(&mut self, idx: usize) {
        self.scenario_idx = idx;
        self.demo_bubbles.clear();
        self.demo_phase = Phase::Listening;
        self.demo_running = true;
        self.scroll = 0;
        self.screen = Screen::Demo;
    }

    /// Open the report screen from a stored result (NoReport when absent)
    fn open_report(&mut self, result: Option<StoredResult>) {
        self.result = result;
        self.booking = BookingState::Idle;
        self.report_scroll = 0;
        self.screen = Screen::Report;
    }

    /// Keep the input bar consistent with the machine state
    fn sync_input(&mut self) {
        let (enabled, mode, placeholder) = if self.waiting {
            (false, InputMode::Text, "Ayu is thinking...")
        } else {
            match &self.field {
                Some(f) if f.kind.is_selection() => {
                    (false, InputMode::Text, "Select an option above...")
                }
                Some(f) if f.kind == FieldType::Payment => {
                    (false, InputMode::Text, "Complete the payment above (Ctrl+P)...")
                }
                Some(f) => (
                    true,
                    match f.kind {
                        FieldType::Number => InputMode::Number,
                        FieldType::Date => InputMode::Date,
                        _ => InputMode::Text,
                    },
                    "Type your symptoms or health query...",
                ),
                None => (true, InputMode::Text, "Type your symptoms or health query..."),
            }
        };
        self.input.set_enabled(enabled);
        self.input.set_mode(mode);
        self.input.set_placeholder(placeholder);
    }

    // --- Event handling ---

    fn on_ui_event(&mut self, event: UiEvent, store: &ResultStore) -> Option<FlowCmd> {
        match event {
            UiEvent::Intake(event) => self.on_intake_event(event, store),
            UiEvent::Demo(event) => {
                self.on_demo_event(event);
                None
            }
            UiEvent::Booking(result) => self.on_booking_result(result),
        }
    }

    fn on_intake_event(&mut self, event: IntakeEvent, store: &ResultStore) -> Option<FlowCmd> {
        match event {
            IntakeEvent::ExchangeStart => {
                self.waiting = true;
                self.banner = None;
                self.spinner_start = Instant::now();
                self.sync_input();
            }
            IntakeEvent::MessageAppended { message } => {
                self.bubbles.push(to_bubble(&message));
                self.scroll = 0;
            }
            IntakeEvent::FieldChanged { field } => {
                if field.kind.is_selection() {
                    self.chips.set_options(field.options.clone());
                } else {
                    self.chips.clear();
                }
                self.field = Some(field);
                self.sync_input();
            }
            IntakeEvent::SpeechReady => {}
            IntakeEvent::ExchangeEnd => {
                self.waiting = false;
                self.sync_input();
            }
            IntakeEvent::Error { message } => {
                self.banner = Some(message);
            }
            IntakeEvent::Completed { completion } => {
                // Carry the identity the conversation collected into the
                // cross-view session
                if let Some(name) = completion.collected.get("name") {
                    self.session.set_name(name.clone());
                }
                if let Some(email) = completion.collected.get("email") {
                    self.session.set_email(email.clone());
                }
                let stored = match store.save(&completion) {
                    Ok(_) => store.load(),
                    Err(e) => {
                        tracing::warn!("could not persist report: {e}");
                        None
                    }
                };
                // Hand the payload straight through even if persistence
                // failed; the store only matters across restarts.
                let stored = stored.unwrap_or(StoredResult {
                    saved_at: chrono::Utc::now().timestamp_millis(),
                    report: completion.report,
                    collected: completion.collected,
                });
                self.open_report(Some(stored));
                return Some(FlowCmd::Speak(REVIEW_GREETING));
            }
        }
        None
    }

    fn on_demo_event(&mut self, event: DemoEvent) {
        match event {
            DemoEvent::PhaseChanged(phase) => self.demo_phase = phase,
            DemoEvent::Line { line, timestamp } => {
                self.demo_bubbles.push(script_bubble(&line, timestamp));
                if let Some(referral) = &line.referral {
                    self.demo_bubbles.push(ChatBubble::assistant(
                        format!(
                            "⚑ PRIORITY REFERRAL — {} ({}). Earliest slot: {}",
                            referral.kind, referral.specialty, referral.slot
                        ),
                        String::new(),
                    ));
                }
                self.scroll = 0;
            }
            DemoEvent::Finished => self.demo_running = false,
        }
    }

    fn on_booking_result(
        &mut self,
        result: Result<ayu_api::BookingConfirmation, String>,
    ) -> Option<FlowCmd> {
        match result {
            Ok(confirmation) if confirmation.success => {
                self.details = Some(confirmation.appointment_details.unwrap_or_default());
                self.fallback_id = format!(
                    "#AYU-{}",
                    &uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase()
                );
                self.booking = BookingState::Idle;
                self.screen = Screen::Confirmed;
                Some(FlowCmd::Speak(CONFIRMATION_VOICE))
            }
            _ => {
                self.booking =
                    BookingState::Failed("Failed to book appointment. Please try again.".into());
                None
            }
        }
    }

    // --- Key handling ---

    fn handle_action(&mut self, action: Action) -> Option<FlowCmd> {
        if matches!(action, Action::Interrupt | Action::Quit) {
            return Some(FlowCmd::Quit);
        }
        match self.screen {
            Screen::Language => self.handle_language_action(action),
            Screen::Intake => self.handle_intake_action(action),
            Screen::Report => self.handle_report_action(action),
            Screen::Confirmed => match action {
                Action::Submit | Action::Escape => Some(FlowCmd::Quit),
                _ => None,
            },
            Screen::DemoPicker => self.handle_picker_action(action),
            Screen::Demo => match action {
                Action::Escape => Some(FlowCmd::StopDemo),
                Action::Up => {
                    self.scroll = self.scroll.saturating_add(1);
                    None
                }
                Action::Down => {
                    self.scroll = self.scroll.saturating_sub(1);
                    None
                }
                _ => None,
            },
        }
    }

    fn handle_language_action(&mut self, action: Action) -> Option<FlowCmd> {
        match action {
            Action::Up | Action::BackTab => {
                self.language_idx =
                    (self.language_idx + Language::ALL.len() - 1) % Language::ALL.len();
                None
            }
            Action::Down | Action::Tab => {
                self.language_idx = (self.language_idx + 1) % Language::ALL.len();
                None
            }
            Action::Submit => {
                let language = Language::ALL[self.language_idx];
                Some(FlowCmd::StartConversation(language))
            }
            Action::Char('d') => {
                self.screen = Screen::DemoPicker;
                None
            }
            Action::Escape => Some(FlowCmd::Quit),
            _ => None,
        }
    }

    fn handle_intake_action(&mut self, action: Action) -> Option<FlowCmd> {
        let selection_active = !self.waiting
            && self
                .field
                .as_ref()
                .is_some_and(|f| f.kind.is_selection());

        match action {
            Action::Replay => Some(FlowCmd::Forward(UserAction::Replay)),
            Action::Pay => {
                let payment_active = !self.waiting
                    && self
                        .field
                        .as_ref()
                        .is_some_and(|f| f.kind == FieldType::Payment);
                payment_active.then_some(FlowCmd::Forward(UserAction::Pay))
            }
            Action::Up => {
                self.scroll = self.scroll.saturating_add(1);
                None
            }
            Action::Down => {
                self.scroll = self.scroll.saturating_sub(1);
                None
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_add(10);
                None
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_sub(10);
                None
            }
            Action::Left | Action::BackTab if selection_active => {
                self.chips.prev();
                None
            }
            Action::Right | Action::Tab if selection_active => {
                self.chips.next();
                None
            }
            Action::Submit => {
                if self.waiting {
                    return None;
                }
                if selection_active {
                    let option = self.chips.selected_label()?.to_string();
                    self.scroll = 0;
                    return Some(FlowCmd::Forward(UserAction::Choose(option)));
                }
                let text = self.input.take();
                if text.is_empty() {
                    return None;
                }
                self.scroll = 0;
                Some(FlowCmd::Forward(UserAction::Text(text)))
            }
            other => {
                self.input.handle_action(&other);
                None
            }
        }
    }

    fn handle_report_action(&mut self, action: Action) -> Option<FlowCmd> {
        if self.result.is_none() {
            // NoReport fallback: only path forward is a fresh assessment
            return match action {
                Action::Submit => Some(FlowCmd::StartConversation(self.session.language())),
                Action::Escape => Some(FlowCmd::Quit),
                _ => None,
            };
        }
        match action {
            Action::Submit => {
                if matches!(self.booking, BookingState::InFlight) {
                    None
                } else {
                    Some(FlowCmd::Book)
                }
            }
            Action::Char('e') => Some(FlowCmd::StartConversation(self.session.language())),
            Action::Up => {
                self.report_scroll = self.report_scroll.saturating_sub(1);
                None
            }
            Action::Down => {
                self.report_scroll = self.report_scroll.saturating_add(1);
                None
            }
            Action::PageUp => {
                self.report_scroll = self.report_scroll.saturating_sub(10);
                None
            }
            Action::PageDown => {
                self.report_scroll = self.report_scroll.saturating_add(10);
                None
            }
            Action::Escape => Some(FlowCmd::Quit),
            _ => None,
        }
    }

    fn handle_picker_action(&mut self, action: Action) -> Option<FlowCmd> {
        match action {
            Action::Up => {
                self.scenario_idx =
                    (self.scenario_idx + self.scenarios.len() - 1) % self.scenarios.len();
                None
            }
            Action::Down => {
                self.scenario_idx = (self.scenario_idx + 1) % self.scenarios.len();
                None
            }
            Action::Submit => Some(FlowCmd::StartDemo(self.scenario_idx)),
            Action::Escape => {
                self.screen = Screen::Language;
                None
            }
            _ => None,
        }
    }

    // --- Rendering ---

    fn render(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Language => self.render_language(frame),
            Screen::Intake => self.render_intake(frame),
            Screen::Report => self.render_report(frame),
            Screen::Confirmed => self.render_confirmed(frame),
            Screen::DemoPicker => self.render_picker(frame),
            Screen::Demo => self.render_demo(frame),
        }
    }

    fn render_language(&self, frame: &mut Frame) {
        let theme = &self.theme;
        let mut lines = vec![
            Line::from(Span::styled("Ayu — Health Intelligence", theme.accent_bold())),
            Line::from(Span::styled(
                "Your secure assistant for preliminary medical screening",
                theme.dim_style(),
            )),
            Line::default(),
            Line::from(Span::styled("Choose your language:", theme.base_style())),
            Line::default(),
        ];
        for (i, language) in Language::ALL.iter().enumerate() {
            let marker = if i == self.language_idx { "● " } else { "  " };
            let style = if i == self.language_idx {
                theme.accent_bold()
            } else {
                theme.base_style()
            };
            lines.push(Line::from(Span::styled(
                format!("{}{} · {}", marker, language.as_str(), language.native_label()),
                style,
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "[↑/↓] select   [Enter] continue   [d] AI-doctor demo   [Ctrl+Q] quit",
            theme.dim_style(),
        )));

        let area = centered(frame.area(), 64, lines.len() as u16 + 2);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_intake(&mut self, frame: &mut Frame) {
        let selection_active = !self.waiting && !self.chips.is_empty();
        let mut constraints = vec![Constraint::Length(1), Constraint::Min(3)];
        if self.banner.is_some() {
            constraints.push(Constraint::Length(1));
        }
        if selection_active {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(3));
        constraints.push(Constraint::Length(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());

        let mut row = 0;
        self.render_header(frame, rows[row], "Ayu — Patient Intake");
        row += 1;

        let body = rows[row];
        row += 1;
        let (list_area, spinner_area) = if self.waiting && body.height > 1 {
            (
                Rect::new(body.x, body.y, body.width, body.height - 1),
                Some(Rect::new(body.x, body.y + body.height - 1, body.width, 1)),
            )
        } else {
            (body, None)
        };
        let max_scroll =
            MessageList::line_count(&self.bubbles, list_area.width).saturating_sub(1);
        self.scroll = self.scroll.min(max_scroll);
        frame.render_widget(
            MessageList::new(&self.bubbles, &self.theme).scrolled_up(self.scroll),
            list_area,
        );
        if let Some(area) = spinner_area {
            frame.render_widget(
                ThinkingIndicator::new("Ayu is thinking...", &self.theme)
                    .with_start(self.spinner_start),
                area,
            );
        }

        if let Some(banner) = &self.banner {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("  {}", banner),
                    self.theme.error_style(),
                ))),
                rows[row],
            );
            row += 1;
        }

        if selection_active {
            let area = rows[row];
            self.chips.render(area, frame.buffer_mut(), &self.theme);
            row += 1;
        }

        let input_area = rows[row];
        row += 1;
        self.input.render(input_area, frame.buffer_mut(), &self.theme);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "[Enter] send   [←/→] choose option   [Ctrl+P] pay   [Ctrl+R] replay voice   \
                 [Ctrl+Q] quit — Ayu can make mistakes, verify important medical info",
                self.theme.dim_style(),
            ))),
            rows[row],
        );
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, title: &str) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(42)])
            .split(area);
        let mut spans = vec![
            Span::styled(title, self.theme.accent_bold()),
            Span::styled(
                format!("  •  {}", self.session.language().as_str()),
                self.theme.dim_style(),
            ),
        ];
        if let Some(name) = self.session.name() {
            spans.push(Span::styled(
                format!("  •  {}", name),
                self.theme.dim_style(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), cols[0]);

        let active = if self.screen == Screen::Demo {
            match self.demo_phase {
                Phase::Listening => 0,
                Phase::Thinking => 1,
                Phase::Speaking => 2,
            }
        } else if self.waiting {
            1
        } else if self.player.is_playing() {
            2
        } else {
            0
        };
        frame.render_widget(ActivityStrip::phases(active, &self.theme), cols[1]);
    }

    fn render_report(&mut self, frame: &mut Frame) {
        let Some(result) = &self.result else {
            self.render_no_report(frame);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let lines = report_lines(result, &self.theme);
        let max_scroll = (lines.len() as u16).saturating_sub(1);
        self.report_scroll = self.report_scroll.min(max_scroll);
        let block = Block::default()
            .title(" Report Preview — Step 2 of 3 ")
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((self.report_scroll, 0)),
            rows[0],
        );

        let footer = match &self.booking {
            BookingState::InFlight => Line::from(Span::styled(
                "⋯ Generating Report...",
                self.theme.accent_style(),
            )),
            BookingState::Failed(message) => Line::from(vec![
                Span::styled(format!("{}  ", message), self.theme.error_style()),
                Span::styled(
                    "[Enter] retry   [e] edit details   [Ctrl+Q] quit",
                    self.theme.dim_style(),
                ),
            ]),
            BookingState::Idle => Line::from(Span::styled(
                "[Enter] confirm & generate report   [e] edit details   [↑/↓] scroll   [Ctrl+Q] quit",
                self.theme.dim_style(),
            )),
        };
        frame.render_widget(Paragraph::new(footer), rows[1]);
    }

    fn render_no_report(&self, frame: &mut Frame) {
        let theme = &self.theme;
        let lines = vec![
            Line::from(Span::styled("No Report Data Found", theme.accent_bold())),
            Line::default(),
            Line::from(Span::styled(
                "Please complete the intake assessment first.",
                theme.dim_style(),
            )),
            Line::default(),
            Line::from(Span::styled(
                "[Enter] start assessment   [Ctrl+Q] quit",
                theme.dim_style(),
            )),
        ];
        let area = centered(frame.area(), 52, lines.len() as u16 + 2);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_confirmed(&self, frame: &mut Frame) {
        let details = self.details.clone().unwrap_or_default();
        let mut lines = confirmation_lines(
            &details,
            self.result.as_ref(),
            &self.fallback_id,
            &self.theme,
        );
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "[Enter] finish   [Ctrl+Q] quit",
            self.theme.dim_style(),
        )));

        let block = Block::default()
            .title(" Step 3 of 3 — Confirmed ")
            .title_style(self.theme.success_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let area = centered(frame.area(), 72, lines.len() as u16 + 2);
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
    }

    fn render_picker(&self, frame: &mut Frame) {
        let theme = &self.theme;
        let mut lines = vec![
            Line::from(Span::styled("Ayu — AI Doctor", theme.accent_bold())),
            Line::from(Span::styled("Choose a symptom scenario:", theme.dim_style())),
            Line::default(),
        ];
        for (i, scenario) in self.scenarios.iter().enumerate() {
            let marker = if i == self.scenario_idx { "● " } else { "  " };
            let style = if i == self.scenario_idx {
                theme.accent_bold()
            } else {
                theme.base_style()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{}{}", marker, scenario.label), style),
                Span::styled(
                    format!("  {} • {}", scenario.doctor, scenario.specialist),
                    theme.dim_style(),
                ),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "[↑/↓] select   [Enter] play   [Esc] back   [Ctrl+Q] quit",
            theme.dim_style(),
        )));

        let area = centered(frame.area(), 64, lines.len() as u16 + 2);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_demo(&mut self, frame: &mut Frame) {
        let scenario = &self.scenarios[self.scenario_idx];
        let title = format!(
            "AI Doctor — Case #{} ({})",
            scenario.case_id, scenario.doctor
        );

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, rows[0], &title);

        let body = rows[1];
        let thinking = self.demo_phase == Phase::Thinking;
        let (list_area, spinner_area) = if thinking && body.height > 1 {
            (
                Rect::new(body.x, body.y, body.width, body.height - 1),
                Some(Rect::new(body.x, body.y + body.height - 1, body.width, 1)),
            )
        } else {
            (body, None)
        };
        let max_scroll =
            MessageList::line_count(&self.demo_bubbles, list_area.width).saturating_sub(1);
        self.scroll = self.scroll.min(max_scroll);
        frame.render_widget(
            MessageList::new(&self.demo_bubbles, &self.theme).scrolled_up(self.scroll),
            list_area,
        );
        if let Some(area) = spinner_area {
            frame.render_widget(
                ThinkingIndicator::new("typing...", &self.theme).with_start(self.spinner_start),
                area,
            );
        }

        let footer = if self.demo_running {
            "AI recommendations are for informational purposes — [Esc] back   [Ctrl+Q] quit"
        } else {
            "Playback finished — [Esc] back   [Ctrl+Q] quit"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(footer, self.theme.dim_style()))),
            rows[2],
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn time_label(timestamp: i64) -> String {
    chrono::Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn to_bubble(message: &Message) -> ChatBubble {
    let time = time_label(message.timestamp);
    match message.role {
        Role::User => ChatBubble::user(message.content.clone(), time),
        Role::Assistant if message.kind == MessageKind::Payment => {
            ChatBubble::payment(message.content.clone(), time)
        }
        Role::Assistant if message.is_error => ChatBubble::error(message.content.clone(), time),
        Role::Assistant => ChatBubble::assistant(message.content.clone(), time),
    }
}

fn script_bubble(line: &ScriptLine, timestamp: i64) -> ChatBubble {
    let time = time_label(timestamp);
    match line.role {
        Role::User => ChatBubble::user(line.text.clone(), time),
        Role::Assistant => ChatBubble::assistant(line.text.clone(), time),
    }
}

/// Everything `run` needs from the binary entry point
pub struct RunOptions {
    pub client: IntakeClient,
    pub player: Arc<dyn SpeechPlayer>,
    /// Skip the language picker and start straight in this language
    pub preset_language: Option<Language>,
    /// Initial highlight on the language picker
    pub default_language: Language,
    /// Open the saved report review instead of starting a conversation
    pub open_report: bool,
}

/// Restores the terminal even when the loop errors out
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the client: language → intake → report → confirmation, with the
/// AI-doctor demo reachable from the language screen.
pub async fn run(options: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        client,
        player,
        preset_language,
        default_language,
        open_report,
    } = options;

    let service = Arc::new(HttpIntakeService::new(client.clone()));
    let synth: Arc<dyn SpeechSynth> = service.clone();
    let store = ResultStore::new();

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiEvent>(64);
    let mut state = UiState::new(preset_language.unwrap_or(default_language), player.clone());
    let mut actions_tx: Option<mpsc::Sender<UserAction>> = None;
    let mut conversation_task: Option<JoinHandle<()>> = None;
    let mut demo_task: Option<JoinHandle<()>> = None;

    let mut guard = TerminalGuard::new()?;
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(80));

    // Entry point: straight to the report, straight into a conversation, or
    // the language picker.
    let mut startup_cmd = if open_report {
        state.open_report(store.load());
        None
    } else {
        preset_language.map(FlowCmd::StartConversation)
    };

    let result = loop {
        if let Some(cmd) = startup_cmd.take() {
            if execute_cmd(
                cmd,
                &mut state,
                &service,
                &synth,
                &player,
                &client,
                &ui_tx,
                &mut actions_tx,
                &mut conversation_task,
                &mut demo_task,
            )
            .await
            {
                break Ok(());
            }
        }

        if let Err(e) = guard.terminal.draw(|frame| state.render(frame)) {
            break Err(e.into());
        }

        let cmd = tokio::select! {
            Some(event) = ui_rx.recv() => state.on_ui_event(event, &store),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    match event {
                        Event::Key(key) if key.kind != KeyEventKind::Release => {
                            state.handle_action(key_to_action(key))
                        }
                        Event::Paste(text) => {
                            state.input.handle_action(&Action::Paste(text));
                            None
                        }
                        _ => None,
                    }
                }
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            },
            _ = tick.tick() => None,
        };

        if let Some(cmd) = cmd {
            if execute_cmd(
                cmd,
                &mut state,
                &service,
                &synth,
                &player,
                &client,
                &ui_tx,
                &mut actions_tx,
                &mut conversation_task,
                &mut demo_task,
            )
            .await
            {
                break Ok(());
            }
        }
    };

    if let Some(task) = demo_task {
        task.abort();
    }
    if let Some(task) = conversation_task {
        task.abort();
    }
    drop(guard);
    result
}

/// Execute a flow command; returns true when the app should quit.
#[allow(clippy::too_many_arguments)]
async fn execute_cmd(
    cmd: FlowCmd,
    state: &mut UiState,
    service: &Arc<HttpIntakeService>,
    synth: &Arc<dyn SpeechSynth>,
    player: &Arc<dyn SpeechPlayer>,
    client: &IntakeClient,
    ui_tx: &mpsc::Sender<UiEvent>,
    actions_tx: &mut Option<mpsc::Sender<UserAction>>,
    conversation_task: &mut Option<JoinHandle<()>>,
    demo_task: &mut Option<JoinHandle<()>>,
) -> bool {
    match cmd {
        FlowCmd::Quit => return true,
        FlowCmd::StartConversation(language) => {
            // Replacing the channel ends any previous conversation task
            let machine = IntakeMachine::new(
                service.clone(),
                player.clone(),
                Arc::new(TokioClock),
            )
            .with_seed("language", language.as_str());
            let (tx, rx) = mpsc::channel(16);
            *conversation_task = Some(spawn_conversation(machine, rx, ui_tx.clone()));
            let _ = tx.send(UserAction::Start).await;
            *actions_tx = Some(tx);
            state.begin_intake(language);
        }
        FlowCmd::Forward(action) => {
            if let Some(tx) = actions_tx {
                if matches!(
                    action,
                    UserAction::Text(_) | UserAction::Choose(_) | UserAction::Pay
                ) {
                    state.waiting = true;
                    state.spinner_start = Instant::now();
                    state.sync_input();
                }
                let _ = tx.send(action).await;
            }
        }
        FlowCmd::Book => {
            if let Some(result) = &state.result {
                let patient_data = if result.report.patient_data.is_empty() {
                    result
                        .collected
                        .iter()
                        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                        .collect()
                } else {
                    result.report.patient_data.clone()
                };
                let request = BookingRequest {
                    patient_data,
                    medical_analysis: result.report.medical_analysis.clone(),
                };
                state.booking = BookingState::InFlight;
                spawn_booking(client.clone(), request, ui_tx.clone());
            }
        }
        FlowCmd::StartDemo(idx) => {
            if let Some(task) = demo_task.take() {
                task.abort();
            }
            let scenario = state.scenarios[idx].clone();
            let sequencer = ScriptedSequencer::new(
                scenario,
                state.session.language(),
                synth.clone(),
                player.clone(),
                Arc::new(TokioClock),
            );
            *demo_task = Some(spawn_demo(sequencer, ui_tx.clone()));
            state.begin_demo(idx);
        }
        FlowCmd::StopDemo => {
            if let Some(task) = demo_task.take() {
                task.abort();
            }
            state.player.stop();
            state.demo_running = false;
            state.screen = Screen::DemoPicker;
        }
        FlowCmd::Speak(text) => {
            spawn_speech(
                synth.clone(),
                player.clone(),
                text.to_string(),
                state.session.language().as_str().to_string(),
            );
        }
    }
    false
}
