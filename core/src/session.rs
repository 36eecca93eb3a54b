//! Session context — the signed-in user, the tutorial flag, the pending
//! classification and the local complaint working set.
//!
//! Lifecycle:
//!   - `init`: hydrate from the persisted store. Corrupt or unreadable
//!     values are logged and treated as absent; init never fails.
//!   - `teardown`: logout. Clears user, tutorial flag and pending
//!     classification from memory and from the store.
//!
//! RULE: every mutation writes through to the store before returning.

use crate::{
    complaint::{Complaint, ComplaintStatus},
    config::ComplaintSource,
    error::DeskResult,
    gate::{GateAction, GateState},
    ledger::{self, WorkingSet},
    store::KeyValueStore,
    types::{KEY_COMPLAINTS, KEY_HAS_SEEN_VIDEO, KEY_USER},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

pub struct SessionContext {
    store: Box<dyn KeyValueStore>,
    source: ComplaintSource,
    user: Option<User>,
    has_seen_video: bool,
    pending_classification: Option<Complaint>,
    complaints: WorkingSet,
}

impl SessionContext {
    pub fn init(store: Box<dyn KeyValueStore>, source: ComplaintSource) -> Self {
        let user = read_key(store.as_ref(), KEY_USER).and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| log::warn!("ignoring malformed persisted user: {e}"))
                .ok()
        });

        let has_seen_video = read_key(store.as_ref(), KEY_HAS_SEEN_VIDEO)
            .is_some_and(|raw| raw == "true");

        let complaints = match source {
            ComplaintSource::Local => read_key(store.as_ref(), KEY_COMPLAINTS)
                .and_then(|raw| {
                    let decoded = ledger::decode_list(&raw);
                    if decoded.is_none() {
                        log::warn!("ignoring malformed persisted complaint list");
                    }
                    decoded
                })
                .unwrap_or_default(),
            ComplaintSource::Remote => Vec::new(),
        };

        let session = Self {
            store,
            source,
            user,
            has_seen_video,
            pending_classification: None,
            complaints,
        };
        log::debug!(
            "session hydrated: gate={:?} complaints={}",
            session.gate_state(),
            session.complaints.len()
        );
        session
    }

    // ── Facts ──────────────────────────────────────────────────

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn has_seen_video(&self) -> bool {
        self.has_seen_video
    }

    pub fn gate_state(&self) -> GateState {
        GateState::from_facts(self.is_authenticated(), self.has_seen_video)
    }

    pub fn pending_classification(&self) -> Option<&Complaint> {
        self.pending_classification.as_ref()
    }

    pub fn complaints(&self) -> &[Option<Complaint>] {
        &self.complaints
    }

    // ── Gate transitions ───────────────────────────────────────

    /// Completing or skipping the tutorial. Idempotent.
    pub fn mark_video_seen(&mut self, action: GateAction) -> DeskResult<()> {
        let next = self.transition(action);
        if next.has_seen_video() {
            self.has_seen_video = true;
            self.store.set(KEY_HAS_SEEN_VIDEO, "true")?;
        }
        Ok(())
    }

    /// Store the user and fold the pending classification into the
    /// working set. Returns the reconciled complaint, if there was one.
    pub fn log_in(&mut self, user: User) -> DeskResult<Option<Complaint>> {
        self.transition(GateAction::Authenticate);
        self.store.set(KEY_USER, &serde_json::to_string(&user)?)?;
        log::info!("user {} signed in", user.email);
        self.user = Some(user);

        let Some(pending) = self.pending_classification.take() else {
            return Ok(None);
        };
        self.add_complaint(pending.clone())?;
        Ok(Some(pending))
    }

    pub fn teardown(&mut self) -> DeskResult<()> {
        self.transition(GateAction::Logout);
        if let Some(user) = self.user.take() {
            log::info!("user {} signed out", user.email);
        }
        self.has_seen_video = false;
        self.pending_classification = None;
        self.store.remove(KEY_USER)?;
        self.store.remove(KEY_HAS_SEEN_VIDEO)?;
        Ok(())
    }

    fn transition(&self, action: GateAction) -> GateState {
        let from = self.gate_state();
        let to = from.apply(action);
        log::debug!("gate {from:?} --{action:?}--> {to:?}");
        to
    }

    // ── Complaints ─────────────────────────────────────────────

    /// Park a classification until the user authenticates.
    /// A newer classification replaces an older unsaved one.
    pub fn set_pending_classification(&mut self, complaint: Complaint) {
        self.pending_classification = Some(complaint);
    }

    pub fn clear_pending_classification(&mut self) {
        self.pending_classification = None;
    }

    /// Append a complaint unless its id is already present.
    pub fn add_complaint(&mut self, complaint: Complaint) -> DeskResult<bool> {
        let added = ledger::insert_unique(&mut self.complaints, complaint);
        if added {
            self.persist_complaints()?;
        }
        Ok(added)
    }

    /// Replace the status of one complaint. Unknown ids are a no-op.
    pub fn set_complaint_status(
        &mut self,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> DeskResult<bool> {
        if !ledger::contains_id(&self.complaints, complaint_id) {
            return Ok(false);
        }
        self.complaints = ledger::set_status(&self.complaints, complaint_id, status);
        self.persist_complaints()?;
        Ok(true)
    }

    /// Swap in the server's copy of a complaint. Returns whether a record
    /// with its id was present.
    pub fn replace_complaint(&mut self, complaint: Complaint) -> DeskResult<bool> {
        if !ledger::contains_id(&self.complaints, &complaint.complaint_id) {
            return Ok(false);
        }
        self.complaints = ledger::replace(&self.complaints, complaint);
        self.persist_complaints()?;
        Ok(true)
    }

    /// Replace the whole working set (remote refresh).
    pub fn replace_complaints(&mut self, complaints: WorkingSet) -> DeskResult<()> {
        self.complaints = complaints;
        self.persist_complaints()
    }

    fn persist_complaints(&mut self) -> DeskResult<()> {
        if self.source != ComplaintSource::Local {
            return Ok(());
        }
        let raw = serde_json::to_string(&self.complaints)?;
        self.store.set(KEY_COMPLAINTS, &raw)
    }
}

fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store
        .get(key)
        .map_err(|e| log::warn!("cannot read persisted {key}: {e}"))
        .ok()
        .flatten()
}

fn scalar_as_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "user id must be a string or number, got {other}"
        ))),
    }
}
