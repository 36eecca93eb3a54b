//! Complaint analytics — dashboard counters and the category histogram.
//!
//! `aggregate` is a single pure pass over the working set.
//! It never fails: absent slots count towards `total` only,
//! missing fields fall back to the documented defaults.

use crate::complaint::{Complaint, ComplaintStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintStats {
    pub total: u64,
    pub pending: u64,
    pub resolved: u64,
    pub critical: u64,
    /// Label → count. Labels with no complaints are never present.
    pub categories: BTreeMap<String, u64>,
}

/// One row of the category breakdown panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

impl CategoryShare {
    /// Whole-number percentage for display, e.g. `"75%"`.
    pub fn display_percent(&self) -> String {
        format!("{}%", self.percent.round() as u64)
    }
}

/// Payload of `GET /dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStats {
    #[serde(default)]
    pub total_complaints: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub resolved: u64,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
}

impl From<ServerStats> for ComplaintStats {
    fn from(s: ServerStats) -> Self {
        Self {
            total: s.total_complaints,
            pending: s.pending,
            resolved: s.resolved,
            critical: s.critical,
            categories: s.categories.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }
}

// ── Aggregation ──────────────────────────────────────────────────────────────

pub fn aggregate(records: &[Option<Complaint>]) -> ComplaintStats {
    let mut stats = ComplaintStats {
        total: records.len() as u64,
        ..ComplaintStats::default()
    };

    for c in records.iter().flatten() {
        match c.effective_status() {
            ComplaintStatus::Pending  => stats.pending += 1,
            ComplaintStatus::Resolved => stats.resolved += 1,
        }
        if c.is_critical() {
            stats.critical += 1;
        }
        if let Some(label) = c.category() {
            *stats.categories.entry(label.to_string()).or_default() += 1;
        }
    }

    stats
}

impl ComplaintStats {
    /// `count / total * 100`, or 0 when there are no complaints.
    pub fn share(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// Category rows in label order.
    pub fn breakdown(&self) -> Vec<CategoryShare> {
        self.categories
            .iter()
            .map(|(label, &count)| CategoryShare {
                label: label.clone(),
                count,
                percent: self.share(count),
            })
            .collect()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}
