//! Shared fixtures for desk integration tests.
#![allow(dead_code)]

use complaint_desk_core::{
    analytics::ServerStats,
    api::{AuthResponse, ComplaintApi},
    complaint::{Complaint, ComplaintStatus, Language},
    config::DeskConfig,
    desk::Desk,
    error::{DeskError, DeskResult},
    ledger::{self, WorkingSet},
    session::User,
    store::MemoryStore,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-process stand-in for the classification API.
pub struct FakeApi {
    pub category: String,
    pub classify_calls: Cell<u32>,
    pub auth_calls: Cell<u32>,
    pub stats_calls: Cell<u32>,
    /// When set, every call fails with this status and server message.
    pub failure: RefCell<Option<(u16, Option<String>)>>,
    pub remote: RefCell<WorkingSet>,
    pub server_stats: ServerStats,
    pub updates: RefCell<Vec<(String, Complaint)>>,
    /// Extra fields merged into every classify response.
    pub classify_fields: RefCell<Value>,
    /// Reply body for updates; `None` echoes the request body.
    pub update_reply: RefCell<Option<Value>>,
}

impl FakeApi {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            classify_calls: Cell::new(0),
            auth_calls: Cell::new(0),
            stats_calls: Cell::new(0),
            failure: RefCell::new(None),
            remote: RefCell::new(Vec::new()),
            server_stats: ServerStats::default(),
            updates: RefCell::new(Vec::new()),
            classify_fields: RefCell::new(json!({})),
            update_reply: RefCell::new(None),
        }
    }

    pub fn failing(status: u16, message: Option<&str>) -> Self {
        let api = Self::new("unused");
        *api.failure.borrow_mut() = Some((status, message.map(String::from)));
        api
    }

    fn check(&self) -> DeskResult<()> {
        match self.failure.borrow().clone() {
            Some((status, message)) => Err(DeskError::Api { status, message }),
            None => Ok(()),
        }
    }

    fn user(email: &str, name: &str) -> User {
        User { id: "u-1".into(), name: name.into(), email: email.into() }
    }
}

impl ComplaintApi for FakeApi {
    fn signup(&self, name: &str, email: &str, _password: &str) -> DeskResult<AuthResponse> {
        self.auth_calls.set(self.auth_calls.get() + 1);
        self.check()?;
        Ok(AuthResponse { user: Self::user(email, name), token: Some("tok".into()) })
    }

    fn login(&self, email: &str, _password: &str) -> DeskResult<AuthResponse> {
        self.auth_calls.set(self.auth_calls.get() + 1);
        self.check()?;
        Ok(AuthResponse { user: Self::user(email, "Returning User"), token: None })
    }

    fn classify(&self, _request: &Complaint) -> DeskResult<Value> {
        self.classify_calls.set(self.classify_calls.get() + 1);
        self.check()?;
        let mut reply = json!({ "category": self.category });
        if let (Some(fields), Some(extra)) =
            (reply.as_object_mut(), self.classify_fields.borrow().as_object())
        {
            fields.extend(extra.clone());
        }
        Ok(reply)
    }

    fn dashboard_stats(&self) -> DeskResult<ServerStats> {
        self.stats_calls.set(self.stats_calls.get() + 1);
        self.check()?;
        Ok(self.server_stats.clone())
    }

    fn complaints(&self) -> DeskResult<WorkingSet> {
        self.check()?;
        Ok(self.remote.borrow().clone())
    }

    fn update_complaint(
        &self,
        complaint_id: &str,
        body: &Complaint,
    ) -> DeskResult<Option<Complaint>> {
        self.check()?;
        self.updates
            .borrow_mut()
            .push((complaint_id.to_string(), body.clone()));
        match self.update_reply.borrow().clone() {
            Some(reply) => Ok(ledger::decode_record(reply)),
            None => Ok(Some(body.clone())),
        }
    }
}

pub fn make_desk(api: FakeApi) -> Desk<FakeApi> {
    make_desk_with(DeskConfig::default_test(), api)
}

pub fn make_desk_with(config: DeskConfig, api: FakeApi) -> Desk<FakeApi> {
    init_logging();
    Desk::with_parts(config, api, Box::new(MemoryStore::new()))
}

pub fn complaint(id: &str, text: &str, status: ComplaintStatus, category: &str) -> Complaint {
    let mut c = Complaint::classification_request(id.into(), text, Language::English);
    c.status = Some(status);
    c.category = Some(category.into());
    c
}
