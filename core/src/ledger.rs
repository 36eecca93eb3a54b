//! The complaint working set.
//!
//! The working set is an insertion-ordered `Vec<Option<Complaint>>`.
//! `None` slots stand for entries that were null or not JSON objects in a
//! cached or fetched list; they are kept so totals match the source.
//!
//! RULE: every operation here is pure. Callers own persistence.

use crate::{
    complaint::{Complaint, ComplaintStatus, COMPLAINT_ID_PREFIX},
    types::ComplaintId,
};
use serde_json::Value;

pub type WorkingSet = Vec<Option<Complaint>>;

/// Decode a JSON complaint list element by element.
///
/// Anything that is not an array yields `None`; callers treat that as
/// "no cached list". Elements that are not objects become `None` slots.
pub fn decode_list(raw: &str) -> Option<WorkingSet> {
    let Value::Array(items) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    Some(decode_values(items))
}

pub fn decode_values(items: Vec<Value>) -> WorkingSet {
    items.into_iter().map(decode_record).collect()
}

/// One complaint from a JSON value. Every object decodes; anything else
/// is absent.
pub fn decode_record(item: Value) -> Option<Complaint> {
    match item {
        Value::Object(_) => serde_json::from_value(item)
            .map_err(|e| log::warn!("unreadable complaint record: {e}"))
            .ok(),
        _ => None,
    }
}

pub fn contains_id(records: &[Option<Complaint>], complaint_id: &str) -> bool {
    records
        .iter()
        .flatten()
        .any(|c| c.complaint_id == complaint_id)
}

pub fn find<'a>(records: &'a [Option<Complaint>], complaint_id: &str) -> Option<&'a Complaint> {
    records
        .iter()
        .flatten()
        .find(|c| c.complaint_id == complaint_id)
}

/// Timestamp-derived id, suffixed until it is unique in `records`.
pub fn unique_complaint_id(records: &[Option<Complaint>], now_millis: i64) -> ComplaintId {
    let base = format!("{COMPLAINT_ID_PREFIX}{now_millis}");
    if !contains_id(records, &base) {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !contains_id(records, &candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Append unless a record with the same id is already present.
/// Returns whether the record was added.
pub fn insert_unique(records: &mut WorkingSet, complaint: Complaint) -> bool {
    if contains_id(records, &complaint.complaint_id) {
        log::debug!("complaint {} already in working set", complaint.complaint_id);
        return false;
    }
    records.push(Some(complaint));
    true
}

/// Copy of `records` with the matching record's status replaced.
/// Unknown ids return an identical copy.
pub fn set_status(
    records: &[Option<Complaint>],
    complaint_id: &str,
    status: ComplaintStatus,
) -> WorkingSet {
    records
        .iter()
        .map(|slot| match slot {
            Some(c) if c.complaint_id == complaint_id => Some(Complaint {
                status: Some(status),
                ..c.clone()
            }),
            other => other.clone(),
        })
        .collect()
}

/// Flip the matching record between pending and resolved.
pub fn toggle_status(records: &[Option<Complaint>], complaint_id: &str) -> WorkingSet {
    match find(records, complaint_id) {
        Some(c) => set_status(records, complaint_id, c.effective_status().opposite()),
        None => records.to_vec(),
    }
}

/// Replace a record with an authoritative copy from the server.
/// The slot keeps its position; unknown ids are left alone.
pub fn replace(records: &[Option<Complaint>], updated: Complaint) -> WorkingSet {
    records
        .iter()
        .map(|slot| match slot {
            Some(c) if c.complaint_id == updated.complaint_id => Some(updated.clone()),
            other => other.clone(),
        })
        .collect()
}
