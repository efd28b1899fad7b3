//! Main Application
//!
//! The App owns the stage and the presenter and runs the frame loop:
//! - Event loop (keyboard, resize) over crossterm's async event stream
//! - Stage clock advanced every frame; host events routed to the presenter
//! - Overlay panels whose callbacks report back over a channel
//! - Optional autoplay cycling random expressions
//!
//! # Keys
//!
//! | Key       | Action                               |
//! |-----------|--------------------------------------|
//! | `1`-`5`   | Show greet/encourage/think/warning/success |
//! | `c`       | Toggle top/center anchor             |
//! | `t`       | Warning that hides itself after 2 s  |
//! | `h`       | Hide                                 |
//! | `r`       | Stage results                        |
//! | `Enter`   | Confirm the open panel               |
//! | `q`/`Esc` | Quit                                 |

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use rand::Rng;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use companion_core::{
    Expression, IntroPanel, Phase, Position, PresentationOptions, Presenter, PresenterConfig,
    Stage, StageResultsPanel, StageSummary,
};

use crate::assets;
use crate::render::{viewport_for, StageRenderer};
use crate::script;
use crate::theme::{DIM_GRAY, ERROR_RED};
use crate::widgets::{IntroCard, ResultsCard};

/// Frame tick
const TICK: Duration = Duration::from_millis(16);

/// Timed warning lifetime (`t` key)
const TIMED_WARNING_MS: u64 = 2000;

/// Encouragement shown after the intro is confirmed
const ENCOURAGE_MS: u64 = 3000;

/// Autoplay dwell range, in seconds
const AUTOPLAY_MIN_SECS: u64 = 2;
const AUTOPLAY_MAX_SECS: u64 = 5;

/// Meters the caravan covers per second of play
const METERS_PER_SEC: u64 = 3;

/// Panel callbacks report here
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    IntroConfirmed,
    ResultsContinued,
}

enum Overlay {
    Intro(IntroPanel),
    Results(StageResultsPanel),
}

/// Running tally for the results panel
#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    correct: u32,
    incorrect: u32,
}

impl Tally {
    fn stars(self) -> u8 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            return 0;
        }
        match self.correct * 10 / total {
            9..=10 => 3,
            6..=8 => 2,
            _ if self.correct > 0 => 1,
            _ => 0,
        }
    }
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Terminal size
    size: (u16, u16),

    // === Companion ===
    stage: Stage,
    presenter: Presenter,
    renderer: StageRenderer,
    position: Position,

    // === Overlays ===
    overlay: Option<Overlay>,
    actions_tx: mpsc::UnboundedSender<AppAction>,
    actions_rx: mpsc::UnboundedReceiver<AppAction>,

    // === Demo State ===
    tally: Tally,
    started: Instant,
    /// Time until the next autoplay expression, when autoplay is on
    autoplay: Option<Duration>,
    /// Last asset problem, shown in the status line
    notice: Option<String>,

    /// Last frame time
    last_frame: Instant,
}

impl App {
    /// Create an App sized to the current terminal
    pub fn new(config: PresenterConfig, autoplay: bool) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        Ok(Self::with_size(config, autoplay, size))
    }

    /// Create an App for a terminal of `size` columns × rows
    pub fn with_size(config: PresenterConfig, autoplay: bool, size: (u16, u16)) -> Self {
        let (width, height) = viewport_for(stage_area(size));
        let mut stage = Stage::new(width, height);

        let mut notice = None;
        if let Some(dir) = config.assets_dir.as_deref() {
            if let Err(e) = assets::load_expression_images(&mut stage, dir) {
                warn!(error = %e, "expression images unavailable");
                notice = Some(e.to_string());
            }
        }

        let presenter = Presenter::new(&mut stage, config);
        info!(mode = ?presenter.mode(), width, height, "companion ready");

        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            running: true,
            size,
            stage,
            presenter,
            renderer: StageRenderer::default(),
            position: Position::Top,
            overlay: None,
            actions_tx,
            actions_rx,
            tally: Tally::default(),
            started: Instant::now(),
            autoplay: autoplay.then(|| Duration::from_secs(AUTOPLAY_MIN_SECS)),
            notice,
            last_frame: Instant::now(),
        };
        app.open_intro();
        app
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => {
                            warn!(error = %e, "terminal event error");
                        }
                        None => self.running = false,
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(TICK) => {}
            }

            self.update();
            self.render(terminal)?;
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(w, h) => self.handle_resize(w, h),
            _ => {}
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            KeyCode::Enter => self.confirm_overlay(),

            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.present(Expression::ALL[index], None);
            }
            KeyCode::Char('c') => {
                self.position = match self.position {
                    Position::Top => Position::Center,
                    Position::Center => Position::Top,
                };
                let expression = self.presenter.current_expression().unwrap_or(Expression::Greet);
                self.present(expression, None);
            }
            KeyCode::Char('t') => self.present(Expression::Warning, Some(TIMED_WARNING_MS)),
            KeyCode::Char('h') => self.presenter.hide(&mut self.stage),
            KeyCode::Char('r') => self.open_results(),
            KeyCode::Char('a') => {
                self.autoplay = match self.autoplay {
                    Some(_) => None,
                    None => Some(Duration::ZERO),
                };
            }

            _ => {}
        }
    }

    /// Handle terminal resize
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        let (w, h) = viewport_for(stage_area(self.size));
        self.stage.set_viewport(w, h);
        self.presenter.resize(&mut self.stage, w, h);
    }

    /// Update animations and state
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.tick(delta);
    }

    /// Advance the stage clock by `delta` and process everything that came due
    pub fn tick(&mut self, delta: Duration) {
        for event in self.stage.advance(delta) {
            self.presenter.handle_event(&mut self.stage, event);
        }

        while let Ok(action) = self.actions_rx.try_recv() {
            self.apply_action(action);
        }

        if let Some(remaining) = self.autoplay {
            let remaining = remaining.saturating_sub(delta);
            if remaining.is_zero() && self.overlay.is_none() {
                let mut rng = rand::thread_rng();
                let expression = Expression::ALL[rng.gen_range(0..Expression::ALL.len())];
                self.present(expression, None);
                self.autoplay = Some(Duration::from_secs(
                    rng.gen_range(AUTOPLAY_MIN_SECS..=AUTOPLAY_MAX_SECS),
                ));
            } else {
                self.autoplay = Some(remaining);
            }
        }
    }

    fn apply_action(&mut self, action: AppAction) {
        debug!(?action, "panel action");
        self.overlay = None;
        match action {
            AppAction::IntroConfirmed => {
                self.started = Instant::now();
                self.tally = Tally::default();
                self.present(Expression::Encourage, Some(ENCOURAGE_MS));
            }
            AppAction::ResultsContinued => self.presenter.hide(&mut self.stage),
        }
    }

    fn present(&mut self, expression: Expression, duration_ms: Option<u64>) {
        match expression {
            Expression::Success => self.tally.correct += 1,
            Expression::Warning => self.tally.incorrect += 1,
            _ => {}
        }
        let line = script::line(expression);
        let mut options = PresentationOptions::new()
            .position(self.position)
            .message(line.primary)
            .secondary_message(line.secondary);
        if let Some(ms) = duration_ms {
            options = options.duration_ms(ms);
        }
        self.presenter.show(&mut self.stage, expression, &options);
    }

    fn open_intro(&mut self) {
        let tx = self.actions_tx.clone();
        self.overlay = Some(Overlay::Intro(IntroPanel::new(
            script::INTRO_TITLE,
            script::INTRO_LINES.iter().map(ToString::to_string).collect(),
            script::INTRO_CONFIRM,
            move || {
                let _ = tx.send(AppAction::IntroConfirmed);
            },
        )));
        self.present(Expression::Greet, None);
    }

    fn open_results(&mut self) {
        let elapsed = self.started.elapsed();
        let summary = StageSummary::new(
            (elapsed.as_secs() * METERS_PER_SEC) as u32,
            self.tally.stars(),
            self.tally.correct,
            self.tally.incorrect,
            elapsed,
        );
        let tx = self.actions_tx.clone();
        self.overlay = Some(Overlay::Results(StageResultsPanel::new(
            script::RESULTS_TITLE,
            summary,
            script::RESULTS_CONTINUE,
            move || {
                let _ = tx.send(AppAction::ResultsContinued);
            },
        )));
        let line = script::line(Expression::Success);
        self.presenter.show(
            &mut self.stage,
            Expression::Success,
            &PresentationOptions::new()
                .position(Position::Top)
                .message(line.primary),
        );
    }

    fn confirm_overlay(&mut self) {
        match self.overlay.as_mut() {
            Some(Overlay::Intro(panel)) => {
                panel.confirm();
            }
            Some(Overlay::Results(panel)) => {
                panel.confirm();
            }
            None => {}
        }
    }

    /// Render the current state
    fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            self.draw(area, frame.buffer_mut());
        })?;
        Ok(())
    }

    /// Draw stage, overlay and status line into `buf`
    pub fn draw(&mut self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let stage_rect = Rect::new(area.x, area.y, area.width, area.height.saturating_sub(1));
        self.renderer.render(&self.stage, stage_rect, buf);

        match &self.overlay {
            Some(Overlay::Intro(panel)) => IntroCard::new(panel).render(stage_rect, buf),
            Some(Overlay::Results(panel)) => ResultsCard::new(panel).render(stage_rect, buf),
            None => {}
        }

        if area.height == 0 {
            return;
        }
        let status_y = area.y + area.height - 1;
        let (text, color) = match &self.notice {
            Some(notice) => (notice.clone(), ERROR_RED),
            None => (self.status_line(), DIM_GRAY),
        };
        buf.set_stringn(area.x, status_y, text, usize::from(area.width), Style::default().fg(color));
    }

    fn status_line(&self) -> String {
        let mood = self
            .presenter
            .current_expression()
            .map_or("-", Expression::name);
        let phase = match self.presenter.phase() {
            Phase::Hidden => "hidden",
            Phase::FadingIn => "fading in",
            Phase::Shown => "shown",
            Phase::FadingOut => "fading out",
        };
        let autoplay = if self.autoplay.is_some() { " · autoplay" } else { "" };
        format!(
            " {mood} ({phase}){autoplay} │ 1-5 moods · c anchor · t timed · h hide · r results · a autoplay · q quit"
        )
    }

    // === Accessors ===

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Whether a panel is open
    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}

/// The stage gets everything but the status line
fn stage_area(size: (u16, u16)) -> Rect {
    Rect::new(0, 0, size.0, size.1.saturating_sub(1))
}
