//! Client for the remote classification and authentication API.
//!
//! RULE: Only this module speaks HTTP. The desk talks to the
//! `ComplaintApi` trait so tests can swap in an in-process fake.

use crate::{
    analytics::ServerStats,
    complaint::Complaint,
    config::DeskConfig,
    error::{DeskError, DeskResult},
    ledger::{self, WorkingSet},
    session::User,
};
use reqwest::{
    blocking::{Client, RequestBuilder},
    Url,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Body of a successful `/signup` or `/login` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub trait ComplaintApi {
    fn signup(&self, name: &str, email: &str, password: &str) -> DeskResult<AuthResponse>;

    fn login(&self, email: &str, password: &str) -> DeskResult<AuthResponse>;

    /// Returns the raw response object; the caller merges it over `request`.
    fn classify(&self, request: &Complaint) -> DeskResult<Value>;

    fn dashboard_stats(&self) -> DeskResult<ServerStats>;

    fn complaints(&self) -> DeskResult<WorkingSet>;

    /// `None` when the server acknowledges without echoing a record.
    fn update_complaint(&self, complaint_id: &str, body: &Complaint)
        -> DeskResult<Option<Complaint>>;
}

#[derive(Serialize)]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Blocking JSON-over-HTTP implementation.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &DeskConfig) -> DeskResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `<base>/complaint/<id>` with the id as a single escaped segment.
    fn complaint_url(&self, complaint_id: &str) -> DeskResult<Url> {
        let mut url = Url::parse(&self.url("complaint")).map_err(anyhow::Error::from)?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("api base url {} cannot take a path", self.base_url))?
            .push(complaint_id);
        Ok(url)
    }

    fn send<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> DeskResult<T> {
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::debug!("api error status={status} body={body}");
            return Err(DeskError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        Ok(response.json()?)
    }
}

impl ComplaintApi for HttpApi {
    fn signup(&self, name: &str, email: &str, password: &str) -> DeskResult<AuthResponse> {
        let body = SignupBody { name, email, password };
        self.send(self.client.post(self.url("signup")).json(&body))
    }

    fn login(&self, email: &str, password: &str) -> DeskResult<AuthResponse> {
        let body = LoginBody { email, password };
        self.send(self.client.post(self.url("login")).json(&body))
    }

    fn classify(&self, request: &Complaint) -> DeskResult<Value> {
        self.send(self.client.post(self.url("classify")).json(request))
    }

    fn dashboard_stats(&self) -> DeskResult<ServerStats> {
        self.send(self.client.get(self.url("dashboard/stats")))
    }

    fn complaints(&self) -> DeskResult<WorkingSet> {
        let items: Vec<Value> = self.send(self.client.get(self.url("complaints")))?;
        Ok(ledger::decode_values(items))
    }

    fn update_complaint(
        &self,
        complaint_id: &str,
        body: &Complaint,
    ) -> DeskResult<Option<Complaint>> {
        let url = self.complaint_url(complaint_id)?;
        let reply: Value = self.send(self.client.put(url).json(body))?;
        Ok(ledger::decode_record(reply))
    }
}

/// The server's `error` field, if the body is JSON carrying one.
pub fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}
