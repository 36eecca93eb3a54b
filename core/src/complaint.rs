//! Complaint records and the classification merge.
//!
//! A complaint is created client-side as a classification request,
//! sent to the API, and the response is merged over it.
//! DESIGN RULE: response fields always win over request fields.

use crate::{error::DeskResult, types::ComplaintId};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Category used when the classifier does not return one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Prefix of client-generated complaint ids.
pub const COMPLAINT_ID_PREFIX: &str = "CMP-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(alias = "english", alias = "en")]
    English,
    #[serde(alias = "hindi", alias = "hi")]
    Hindi,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Resolved,
}

impl ComplaintStatus {
    pub fn opposite(self) -> Self {
        match self {
            Self::Pending  => Self::Resolved,
            Self::Resolved => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending  => "pending",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
    Critical,
}

impl Priority {
    /// High and critical complaints both count towards the "critical" card.
    pub fn is_critical(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// One complaint and its classification outcome.
///
/// Decoding is lenient: any JSON object decodes. `status`, `priority` and
/// `category` become `None` when missing, null, or carrying a value this
/// client does not know. Numeric ids are read as strings and an unknown
/// `language` reads as the default. Unrecognized top-level fields from
/// the server are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    #[serde(default, deserialize_with = "scalar_text")]
    pub complaint_id: ComplaintId,
    #[serde(default, deserialize_with = "scalar_text")]
    pub complaint_text: String,
    #[serde(default, deserialize_with = "lenient_language")]
    pub language: Language,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Complaint {
    /// Build the body sent to `POST /classify`.
    ///
    /// Priority starts at `normal`; the classifier may override it in its
    /// response. Category is sent empty and filled by the response.
    pub fn classification_request(
        complaint_id: ComplaintId,
        complaint_text: &str,
        language: Language,
    ) -> Self {
        Self {
            complaint_id,
            complaint_text: complaint_text.to_string(),
            language,
            status: Some(ComplaintStatus::Pending),
            priority: Some(Priority::Normal),
            category: Some(String::new()),
            extra: Map::new(),
        }
    }

    /// Status with the missing case read as pending.
    pub fn effective_status(&self) -> ComplaintStatus {
        self.status.unwrap_or(ComplaintStatus::Pending)
    }

    pub fn is_critical(&self) -> bool {
        self.priority.is_some_and(Priority::is_critical)
    }

    /// Category label, or `None` when missing or blank.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Label shown in complaint lists.
    pub fn category_label(&self) -> &str {
        self.category().unwrap_or("Uncategorized")
    }
}

/// Merge a classification response over the request that produced it.
///
/// Non-object responses carry nothing to merge and leave the request as is.
/// A missing or blank category is replaced with [`DEFAULT_CATEGORY`], and a
/// `language` this client cannot read keeps the request's language.
pub fn merge_classification(request: &Complaint, response: Value) -> DeskResult<Complaint> {
    let mut merged = serde_json::to_value(request)?;
    if let (Some(base), Value::Object(mut fields)) = (merged.as_object_mut(), response) {
        let unreadable_language = fields
            .get("language")
            .is_some_and(|v| Language::deserialize(v).is_err());
        if unreadable_language {
            log::debug!("classifier returned unknown language {:?}", fields.get("language"));
            fields.remove("language");
        }
        base.extend(fields);
    }
    let mut complaint: Complaint = serde_json::from_value(merged)?;
    if complaint.category().is_none() {
        complaint.category = Some(DEFAULT_CATEGORY.to_string());
    }
    if complaint.complaint_id.is_empty() {
        complaint.complaint_id = request.complaint_id.clone();
    }
    Ok(complaint)
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Strings pass through, numbers and booleans are printed, anything else
/// reads as empty.
fn scalar_text<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_language<'de, D>(de: D) -> Result<Language, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(Language::deserialize(&value).unwrap_or_default())
}
