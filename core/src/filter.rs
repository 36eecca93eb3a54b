//! Dashboard search and status filter.

use crate::complaint::{Complaint, ComplaintStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Resolved,
}

impl StatusFilter {
    pub fn matches(self, status: ComplaintStatus) -> bool {
        match self {
            Self::All      => true,
            Self::Pending  => status == ComplaintStatus::Pending,
            Self::Resolved => status == ComplaintStatus::Resolved,
        }
    }
}

/// Stat cards on the dashboard that react to clicks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatCard {
    PendingVsResolved,
    Total,
    Categories,
    Critical,
}

/// Search box plus status dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub query: String,
    pub status: StatusFilter,
}

impl DashboardQuery {
    /// Apply a stat-card click. Total shows everything, Critical narrows to
    /// pending. Other cards, or any click with `enabled == false`, do nothing.
    pub fn click_stat(&mut self, card: StatCard, enabled: bool) {
        if !enabled {
            return;
        }
        match card {
            StatCard::Total    => self.status = StatusFilter::All,
            StatCard::Critical => self.status = StatusFilter::Pending,
            StatCard::PendingVsResolved | StatCard::Categories => {}
        }
    }

    pub fn apply<'a>(&self, records: &'a [Option<Complaint>]) -> Vec<&'a Complaint> {
        filter_complaints(records, &self.query, self.status)
    }
}

/// Records whose text or id contains `query` (case-insensitive) and whose
/// status passes `status`. Input order is preserved; absent slots never match.
pub fn filter_complaints<'a>(
    records: &'a [Option<Complaint>],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a Complaint> {
    let needle = query.to_lowercase();
    records
        .iter()
        .flatten()
        .filter(|c| status.matches(c.effective_status()))
        .filter(|c| {
            needle.is_empty()
                || c.complaint_text.to_lowercase().contains(&needle)
                || c.complaint_id.to_lowercase().contains(&needle)
        })
        .collect()
}
