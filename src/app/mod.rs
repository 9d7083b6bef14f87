//! Event loop, draft flow and worker wiring.

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    api::{Backend, client::HttpBackend},
    config::Config,
    decode::{self, DecodedCode},
    draft::{Draft, ScanOutcome},
    events::{Confirm, Screen, UiState},
    input::{InputBoxState, InputKind, InputTarget},
    scan::{ScanChannel, ScanPublisher},
    session::{Session, SessionState},
    shortcuts::Shortcuts,
    submit::{self, AfterSubmit},
    tasks::PendingTask,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// State shared between input handling and rendering.
pub struct App {
    pub cfg: Config,
    pub ui: UiState,
    pub session: SessionState,
    /// Draft owned by the capture form.
    pub draft: Draft,
    /// Pending tasks for the session's site.
    pub tasks: Vec<PendingTask>,
    /// Form side of the scan handoff.
    pub scans: ScanChannel,
    /// Capture side of the scan handoff.
    pub scanner: ScanPublisher,
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    pub login_cpf: String,
    pub login_matricula: String,
    /// Open input popup, if any.
    pub input_box: Option<InputBoxState>,
    pub shortcuts: Shortcuts,
    /// Submission waiting for the worker's answer.
    pub in_flight: Option<Uuid>,
}

/// Run the main loop until the operator quits.
pub async fn run_app(terminal: &mut Tui, cfg: Config) -> Result<()> {
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&cfg.api)?);

    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(rx_cmd, tx_ev, backend));

    let tick = Duration::from_millis(cfg.app.tick_ms);
    let mut app = App::new(cfg, shortcuts, tx_cmd, rx_ev);

    loop {
        terminal.draw(|f| draw(f, &app))?;

        while let Ok(ev) = app.worker_rx.try_recv() {
            app.handle_worker_event(ev).await?;
        }
        app.poll_scans().await?;

        if event::poll(tick)?
            && let Event::Key(k) = event::read()?
            && k.kind == KeyEventKind::Press
        {
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

impl App {
    pub fn new(
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        let scans = ScanChannel::new();
        let scanner = scans.publisher();
        Self {
            cfg,
            ui: UiState::new(),
            session: SessionState::default(),
            draft: Draft::new(),
            tasks: vec![],
            scans,
            scanner,
            worker_tx,
            worker_rx,
            login_cpf: String::new(),
            login_matricula: String::new(),
            input_box: None,
            shortcuts,
            in_flight: None,
        }
    }

    async fn send(&self, cmd: WorkerCmd) -> Result<()> {
        self.worker_tx.send(cmd).await?;
        Ok(())
    }

    /// Snapshot of the session; bounces to the login screen when there is none.
    fn require_session(&mut self) -> Option<Session> {
        let s = self.session.current().cloned();
        if s.is_none() {
            self.ui.go(Screen::Login);
            self.ui.error = Some("session expired, sign in again".into());
        }
        s
    }

    fn log(&mut self, msg: impl Into<String>) {
        self.ui.log.push(msg.into());
    }

    /// Apply a worker event to the UI state.
    pub async fn handle_worker_event(&mut self, ev: WorkerEvent) -> Result<()> {
        match ev {
            WorkerEvent::SignedIn(session) => {
                self.login_cpf.clear();
                self.session.sign_in(session);
                self.ui.go(Screen::Home);
                self.ui.status = "Signed in".into();
                self.request_refresh().await?;
            }
            WorkerEvent::SignInFailed(msg) => {
                self.ui.error = Some(msg);
            }
            WorkerEvent::SignedOut => {
                self.log("session ended");
            }
            WorkerEvent::TasksLoaded(tasks) => {
                self.tasks = tasks;
                if self.ui.selected >= self.tasks.len() {
                    self.ui.selected = self.tasks.len().saturating_sub(1);
                }
                self.ui.status = format!("{} pending tasks", self.tasks.len());
            }
            WorkerEvent::TaskDetail { task_id, identity } => {
                if self.draft.overlay_task_identity(&task_id, &identity) {
                    self.log(format!("task {task_id}: identity updated to {identity}"));
                }
            }
            WorkerEvent::Product {
                identity,
                description,
            } => {
                // stale answers for an identity no longer in the form are dropped
                if identity != self.draft.identity() {
                    return Ok(());
                }
                let found = description.as_ref().is_some_and(|d| !d.trim().is_empty());
                let free = self.draft.bound_task().is_none();
                self.draft.apply_description(description);
                if !found && free {
                    self.ui.error = Some(format!(
                        "product {identity} not found or without description; code is now editable"
                    ));
                }
            }
            WorkerEvent::Submitted { request_id, ack } => {
                if self.in_flight != Some(request_id) {
                    self.log(format!("submission {request_id} completed"));
                    return Ok(());
                }
                self.in_flight = None;
                self.draft.reset();
                self.ui.status = "Submission recorded".into();
                if let Some(id) = &ack.task_id {
                    self.log(format!("task {id} resolved"));
                }
                match ack.route {
                    AfterSubmit::TaskList => self.ui.go(Screen::Tasks),
                    AfterSubmit::Home => self.ui.go(Screen::Home),
                }
                self.request_refresh().await?;
            }
            WorkerEvent::SubmitFailed { request_id, error } => {
                if self.in_flight == Some(request_id) {
                    self.in_flight = None;
                }
                self.ui.error = Some(error.to_string());
            }
            WorkerEvent::Log(s) => self.log(s),
            WorkerEvent::Error(s) => self.ui.status = format!("Error: {s}"),
        }
        Ok(())
    }

    /// Ask the worker for the pending task list.
    pub async fn request_refresh(&mut self) -> Result<()> {
        if let Some(session) = self.require_session() {
            self.send(WorkerCmd::RefreshTasks(session)).await?;
        }
        Ok(())
    }

    pub async fn sign_in(&mut self) -> Result<()> {
        if self.session.is_signed_in() {
            self.ui.go(Screen::Home);
            return Ok(());
        }
        self.ui.error = None;
        self.ui.status = "Signing in...".into();
        self.send(WorkerCmd::SignIn {
            cpf: self.login_cpf.clone(),
            matricula: self.login_matricula.clone(),
        })
        .await
    }

    /// Clear local state right away; the server-side logout is best effort.
    pub async fn sign_out(&mut self) -> Result<()> {
        let prev = self.session.sign_out();
        self.draft.reset();
        self.tasks.clear();
        self.in_flight = None;
        self.ui.go(Screen::Login);
        if let Some(session) = prev {
            self.send(WorkerCmd::SignOut(session)).await?;
        }
        Ok(())
    }

    /// Enter the form for a free capture.
    pub fn open_capture(&mut self, manual: bool) {
        self.draft.reset();
        if manual {
            self.draft.enable_manual_entry();
        }
        self.ui.go(Screen::Capture);
    }

    /// Bind the selected task to a fresh draft and fetch its detail overlay.
    pub async fn resolve_selected_task(&mut self) -> Result<()> {
        let Some(task) = self.tasks.get(self.ui.selected).cloned() else {
            return Ok(());
        };
        let Some(session) = self.require_session() else {
            return Ok(());
        };
        let task_id = task.id.clone();
        self.draft.bind_to_task(task);
        self.ui.go(Screen::Capture);
        self.ui.status = "Scan the product to validate".into();
        self.send(WorkerCmd::LoadTaskDetail { session, task_id })
            .await
    }

    /// Show the scan surface; the draft is kept.
    pub fn open_scanner(&mut self) {
        self.ui.screen = Screen::Scanner;
        self.input_box = Some(InputBoxState::new(
            "Scan or type the code:",
            "",
            InputKind::Text,
            InputTarget::ScanPayload,
        ));
    }

    /// Publish a captured payload and return to the form.
    pub fn capture_scan(&mut self, payload: &str) {
        let payload = payload.trim();
        if !payload.is_empty() {
            self.scanner.capture(payload);
        }
        self.ui.screen = Screen::Capture;
    }

    /// Consume a waiting scan while the form is mounted.
    pub async fn poll_scans(&mut self) -> Result<()> {
        if self.ui.screen != Screen::Capture {
            return Ok(());
        }
        let mut decoded = None;
        self.scans
            .consume_pending(|s| decoded = Some(decode::decode(&s.payload)));
        if let Some(d) = decoded {
            self.apply_decoded(d).await?;
        }
        Ok(())
    }

    async fn apply_decoded(&mut self, decoded: DecodedCode) -> Result<()> {
        match self.draft.apply_scan(&decoded) {
            ScanOutcome::Mismatch { scanned, expected } => {
                self.ui.error = Some(format!(
                    "wrong product: scanned {scanned}, task expects {expected}; scan the correct product"
                ));
                return Ok(());
            }
            ScanOutcome::Matched => {
                self.ui.error = None;
                self.ui.status = "Product validated".into();
            }
            ScanOutcome::Captured => {
                self.ui.error = None;
                self.ui.status = format!("Scanned {}", decoded.identity);
            }
        }
        if let Some(q) = decoded.quantity_text() {
            self.ui.status = format!("Weight identified: {q} kg");
        }
        self.lookup_product(decoded.identity).await
    }

    async fn lookup_product(&mut self, identity: String) -> Result<()> {
        if identity.is_empty() {
            return Ok(());
        }
        if let Some(session) = self.require_session() {
            self.send(WorkerCmd::LookupProduct { session, identity })
                .await?;
        }
        Ok(())
    }

    /// Check the draft and hand a snapshot to the worker.
    pub async fn submit(&mut self) -> Result<()> {
        if self.in_flight.is_some() {
            self.ui.status = "Submission in progress...".into();
            return Ok(());
        }
        if let Err(e) = submit::check(&self.draft) {
            self.ui.error = Some(e.to_string());
            return Ok(());
        }
        let Some(session) = self.require_session() else {
            return Ok(());
        };
        let request_id = Uuid::new_v4();
        self.in_flight = Some(request_id);
        self.ui.error = None;
        self.ui.status = "Submitting...".into();
        self.send(WorkerCmd::Submit {
            request_id,
            session,
            draft: Box::new(self.draft.clone()),
        })
        .await
    }

    /// Leave the form, asking first when input would be lost.
    pub fn leave_capture(&mut self) {
        if self.draft.has_unsaved_data() {
            self.ui.confirm = Some(Confirm::LeaveCapture);
        } else {
            self.abandon_capture();
        }
    }

    /// Drop the draft unconditionally and go home.
    pub fn abandon_capture(&mut self) {
        self.draft.reset();
        self.in_flight = None;
        self.ui.go(Screen::Home);
    }

    /// Write a confirmed popup value to its target.
    pub async fn apply_input(&mut self, target: InputTarget, value: String) -> Result<()> {
        match target {
            InputTarget::LoginCpf => self.login_cpf = value,
            InputTarget::LoginMatricula => self.login_matricula = value,
            InputTarget::DraftIdentity => match self.draft.set_identity(&value) {
                Ok(()) => {
                    let identity = self.draft.identity().to_string();
                    self.lookup_product(identity).await?;
                }
                Err(e) => self.ui.error = Some(e.to_string()),
            },
            InputTarget::DraftQuantity => {
                if let Err(e) = self.draft.set_quantity(&value) {
                    self.ui.error = Some(e.to_string());
                }
            }
            InputTarget::DraftValidity => self.draft.set_validity_date(&value),
            InputTarget::ScanPayload => self.capture_scan(&value),
        }
        Ok(())
    }
}
