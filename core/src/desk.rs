//! The desk — workflow controller tying the gate, the session, the API
//! and the dashboard together.
//!
//! RULES:
//!   - Every navigation goes through the gate.
//!   - One busy flag per action kind; a second submit while busy is
//!     rejected before any API call.
//!   - A call is started with `begin_*` (which hands out a ticket) and
//!     completed with `finish_*`. Results whose ticket generation no
//!     longer matches are dropped: the user has navigated away.
//!   - Nothing retries. Failures surface once and leave state unchanged.

use crate::{
    analytics::{self, CategoryShare, ComplaintStats},
    api::{AuthResponse, ComplaintApi, HttpApi},
    complaint::{merge_classification, Complaint, ComplaintStatus, Language},
    config::{ComplaintSource, DeskConfig, StatsSource},
    error::{DeskError, DeskResult},
    filter::{DashboardQuery, StatCard, StatusFilter},
    gate::{GateAction, GateState, RenderDecision, View, AFTER_TUTORIAL},
    ledger,
    session::{SessionContext, User},
    store::{self, KeyValueStore},
    types::Generation,
    validation,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Classify,
    Auth,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Auth     => "auth",
        }
    }
}

/// Which form the auth prompt shows after an anonymous classification.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    SignUp,
    LogIn,
}

/// Proof that a call was started, and under which generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub action: Action,
    pub generation: Generation,
}

/// A started classification: the ticket plus the body to send.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub ticket: Ticket,
    pub body: Complaint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Authenticated: the complaint is in the working set.
    Saved(Complaint),
    /// Authenticated, but the response carried an id that was already
    /// saved. Holds the saved record, which is left unchanged.
    AlreadySaved(Complaint),
    /// Anonymous: the complaint waits for signup or login.
    AuthRequired(Complaint),
    /// The user left before the response arrived.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    SignedIn {
        user: User,
        reconciled: Option<Complaint>,
        decision: RenderDecision,
    },
    Discarded,
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BusyFlags {
    pub classify: bool,
    pub auth: bool,
}

impl BusyFlags {
    fn slot(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Classify => &mut self.classify,
            Action::Auth     => &mut self.auth,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub view: View,
    pub gate: GateState,
    pub user: Option<User>,
    pub busy: BusyFlags,
    pub auth_prompt: Option<AuthMode>,
    pub last_result: Option<Complaint>,
    pub stats: ComplaintStats,
    pub breakdown: Vec<CategoryShare>,
    pub query: DashboardQuery,
    pub complaints: Vec<Complaint>,
}

pub struct Desk<A: ComplaintApi = HttpApi> {
    config: DeskConfig,
    api: A,
    session: SessionContext,
    view: View,
    generation: Generation,
    busy: BusyFlags,
    auth_prompt: Option<AuthMode>,
    last_result: Option<Complaint>,
    dashboard: DashboardQuery,
}

impl Desk<HttpApi> {
    /// Build a desk talking HTTP, with the storage backend from `config`.
    pub fn open(config: DeskConfig) -> DeskResult<Self> {
        let api = HttpApi::new(&config)?;
        let store = store::open_backend(&config.storage)?;
        Ok(Self::with_parts(config, api, store))
    }
}

impl<A: ComplaintApi> Desk<A> {
    pub fn with_parts(config: DeskConfig, api: A, store: Box<dyn KeyValueStore>) -> Self {
        let session = SessionContext::init(store, config.complaint_source);
        Self {
            config,
            api,
            session,
            view: View::Start,
            generation: 0,
            busy: BusyFlags::default(),
            auth_prompt: None,
            last_result: None,
            dashboard: DashboardQuery::default(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn busy(&self) -> BusyFlags {
        self.busy
    }

    pub fn auth_prompt(&self) -> Option<AuthMode> {
        self.auth_prompt
    }

    pub fn last_result(&self) -> Option<&Complaint> {
        self.last_result.as_ref()
    }

    pub fn dashboard_query(&self) -> &DashboardQuery {
        &self.dashboard
    }

    // ── Navigation ─────────────────────────────────────────────

    pub fn navigate(&mut self, target: View) -> RenderDecision {
        let decision = self.session.gate_state().decide(target);
        let landed = decision.view();
        if landed != self.view {
            self.generation += 1;
            log::debug!(
                "navigate {:?} -> {:?} ({decision:?}) generation={}",
                self.view,
                landed,
                self.generation
            );
        }
        self.view = landed;
        decision
    }

    pub fn navigate_path(&mut self, path: &str) -> RenderDecision {
        self.navigate(View::from_path(path))
    }

    pub fn complete_tutorial(&mut self) -> DeskResult<RenderDecision> {
        self.session.mark_video_seen(GateAction::CompleteTutorial)?;
        Ok(self.navigate(AFTER_TUTORIAL))
    }

    pub fn skip_tutorial(&mut self) -> DeskResult<RenderDecision> {
        self.session.mark_video_seen(GateAction::SkipTutorial)?;
        Ok(self.navigate(AFTER_TUTORIAL))
    }

    pub fn log_out(&mut self) -> DeskResult<RenderDecision> {
        self.session.teardown()?;
        self.auth_prompt = None;
        self.last_result = None;
        Ok(self.navigate(View::Start))
    }

    // ── Busy flag and tickets ──────────────────────────────────

    fn begin(&mut self, action: Action) -> DeskResult<Ticket> {
        let slot = self.busy.slot(action);
        if *slot {
            return Err(DeskError::Busy { action: action.name() });
        }
        *slot = true;
        Ok(Ticket { action, generation: self.generation })
    }

    /// Release the busy flag. Returns whether the result is still wanted.
    fn finish(&mut self, ticket: Ticket) -> bool {
        *self.busy.slot(ticket.action) = false;
        let fresh = ticket.generation == self.generation;
        if !fresh {
            log::warn!(
                "dropping stale {} result (generation {} != {})",
                ticket.action.name(),
                ticket.generation,
                self.generation
            );
        }
        fresh
    }

    // ── Classification ─────────────────────────────────────────

    pub fn begin_classify(&mut self, text: &str, language: Language) -> DeskResult<ClassifyRequest> {
        validation::validate_complaint_text(text)?;
        let ticket = self.begin(Action::Classify)?;
        let now_millis = chrono::Utc::now().timestamp_millis();
        let complaint_id = ledger::unique_complaint_id(self.session.complaints(), now_millis);
        self.last_result = None;
        Ok(ClassifyRequest {
            ticket,
            body: Complaint::classification_request(complaint_id, text, language),
        })
    }

    pub fn finish_classify(
        &mut self,
        request: ClassifyRequest,
        response: DeskResult<Value>,
    ) -> DeskResult<Submission> {
        if !self.finish(request.ticket) {
            return Ok(Submission::Discarded);
        }
        let complaint = merge_classification(&request.body, response?)?;
        log::debug!(
            "classified {} as {}",
            complaint.complaint_id,
            complaint.category_label()
        );

        if self.session.is_authenticated() {
            if !self.session.add_complaint(complaint.clone())? {
                log::warn!(
                    "classifier returned id {} which is already saved; keeping the saved record",
                    complaint.complaint_id
                );
                let existing = ledger::find(self.session.complaints(), &complaint.complaint_id)
                    .cloned()
                    .unwrap_or(complaint);
                self.last_result = Some(existing.clone());
                return Ok(Submission::AlreadySaved(existing));
            }
            self.last_result = Some(complaint.clone());
            Ok(Submission::Saved(complaint))
        } else {
            self.session.set_pending_classification(complaint.clone());
            self.auth_prompt = Some(AuthMode::SignUp);
            Ok(Submission::AuthRequired(complaint))
        }
    }

    pub fn submit_complaint(&mut self, text: &str, language: Language) -> DeskResult<Submission> {
        let request = self.begin_classify(text, language)?;
        let response = self.api.classify(&request.body);
        self.finish_classify(request, response)
    }

    /// Reset the classify form.
    pub fn new_classification(&mut self) {
        self.last_result = None;
        self.auth_prompt = None;
        self.session.clear_pending_classification();
    }

    pub fn dismiss_auth_prompt(&mut self) {
        self.auth_prompt = None;
    }

    pub fn switch_auth_mode(&mut self) {
        self.auth_prompt = self.auth_prompt.map(|mode| match mode {
            AuthMode::SignUp => AuthMode::LogIn,
            AuthMode::LogIn  => AuthMode::SignUp,
        });
    }

    // ── Authentication ─────────────────────────────────────────

    pub fn begin_sign_up(&mut self, password: &str, confirm_password: &str) -> DeskResult<Ticket> {
        validation::validate_signup(password, confirm_password)?;
        self.begin(Action::Auth)
    }

    pub fn begin_log_in(&mut self) -> DeskResult<Ticket> {
        self.begin(Action::Auth)
    }

    pub fn finish_auth(
        &mut self,
        ticket: Ticket,
        response: DeskResult<AuthResponse>,
    ) -> DeskResult<AuthOutcome> {
        if !self.finish(ticket) {
            return Ok(AuthOutcome::Discarded);
        }
        let response = response?;
        let user = response.user.clone();
        let reconciled = self.session.log_in(response.user)?;
        self.auth_prompt = None;

        // A parked classification brings the user back to its result.
        let next = match &reconciled {
            Some(complaint) => {
                self.last_result = Some(complaint.clone());
                View::Classify
            }
            None => View::Dashboard,
        };
        let decision = self.navigate(next);
        Ok(AuthOutcome::SignedIn { user, reconciled, decision })
    }

    pub fn sign_up(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> DeskResult<AuthOutcome> {
        let ticket = self.begin_sign_up(password, confirm_password)?;
        let response = self.api.signup(name, email, password);
        self.finish_auth(ticket, response)
    }

    pub fn log_in(&mut self, email: &str, password: &str) -> DeskResult<AuthOutcome> {
        let ticket = self.begin_log_in()?;
        let response = self.api.login(email, password);
        self.finish_auth(ticket, response)
    }

    // ── Complaints ─────────────────────────────────────────────

    /// Pull the working set from the server. No-op for the local source.
    pub fn refresh(&mut self) -> DeskResult<()> {
        if self.config.complaint_source != ComplaintSource::Remote {
            return Ok(());
        }
        let complaints = self.api.complaints()?;
        log::debug!("fetched {} complaints", complaints.len());
        self.session.replace_complaints(complaints)
    }

    /// Returns whether a record was changed. Unknown ids are a no-op.
    pub fn set_complaint_status(
        &mut self,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> DeskResult<bool> {
        let Some(current) = ledger::find(self.session.complaints(), complaint_id) else {
            return Ok(false);
        };
        match self.config.complaint_source {
            ComplaintSource::Local => self.session.set_complaint_status(complaint_id, status),
            ComplaintSource::Remote => {
                let body = Complaint { status: Some(status), ..current.clone() };
                match self.api.update_complaint(complaint_id, &body)? {
                    Some(updated) if updated.complaint_id == complaint_id => {
                        self.session.replace_complaint(updated)
                    }
                    reply => {
                        log::debug!(
                            "update of {complaint_id} echoed {:?}; applying status locally",
                            reply.map(|c| c.complaint_id)
                        );
                        self.session.set_complaint_status(complaint_id, status)
                    }
                }
            }
        }
    }

    /// Flip a complaint between pending and resolved.
    pub fn toggle_complaint(&mut self, complaint_id: &str) -> DeskResult<bool> {
        let Some(current) = ledger::find(self.session.complaints(), complaint_id) else {
            return Ok(false);
        };
        let next = current.effective_status().opposite();
        self.set_complaint_status(complaint_id, next)
    }

    /// Dashboard row click: resolves pending complaints, ignores resolved ones.
    pub fn click_complaint(&mut self, complaint_id: &str) -> DeskResult<bool> {
        let pending = ledger::find(self.session.complaints(), complaint_id)
            .is_some_and(|c| c.effective_status() == ComplaintStatus::Pending);
        if !pending {
            return Ok(false);
        }
        self.set_complaint_status(complaint_id, ComplaintStatus::Resolved)
    }

    // ── Dashboard ──────────────────────────────────────────────

    pub fn search(&mut self, query: &str, status: StatusFilter) {
        self.dashboard = DashboardQuery {
            query: query.to_string(),
            status,
        };
    }

    pub fn click_stat(&mut self, card: StatCard) {
        self.dashboard.click_stat(card, self.config.stat_click_filters);
    }

    pub fn visible_complaints(&self) -> Vec<&Complaint> {
        self.dashboard.apply(self.session.complaints())
    }

    pub fn stats(&self) -> DeskResult<ComplaintStats> {
        match self.config.stats_source {
            StatsSource::Local => Ok(analytics::aggregate(self.session.complaints())),
            StatsSource::Remote => Ok(self.api.dashboard_stats()?.into()),
        }
    }

    pub fn view_state(&self) -> DeskResult<ViewState> {
        let stats = self.stats()?;
        Ok(ViewState {
            view: self.view,
            gate: self.session.gate_state(),
            user: self.session.user().cloned(),
            busy: self.busy,
            auth_prompt: self.auth_prompt,
            last_result: self.last_result.clone(),
            breakdown: stats.breakdown(),
            stats,
            query: self.dashboard.clone(),
            complaints: self.visible_complaints().into_iter().cloned().collect(),
        })
    }
}
