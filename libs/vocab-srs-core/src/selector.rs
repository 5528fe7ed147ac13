//! Due-set selection.
//!
//! Overdue words come first, most overdue first, followed by never-reviewed
//! words in their original order. Working the backlog before adding new
//! material keeps the review queue from growing without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReviewRecord;

/// Select the records to review at `now`, in review order.
///
/// `new_item_cap` limits how many never-reviewed words are included; `None`
/// means no limit. An empty result means there is nothing to review.
pub fn select_due(
    records: &[ReviewRecord],
    now: DateTime<Utc>,
    new_item_cap: Option<usize>,
) -> Vec<ReviewRecord> {
    let mut overdue: Vec<&ReviewRecord> = records
        .iter()
        .filter(|r| !r.is_new() && r.is_due(now))
        .collect();

    // Stable sort keeps collection order among equally overdue words.
    overdue.sort_by(|a, b| b.overdue_by(now).cmp(&a.overdue_by(now)));

    let new_items = records
        .iter()
        .filter(|r| r.is_new())
        .take(new_item_cap.unwrap_or(usize::MAX));

    overdue.into_iter().chain(new_items).cloned().collect()
}

/// Counts of what [`select_due`] would return, without cloning records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueSummary {
    pub overdue: usize,
    pub new_available: usize,
}

impl DueSummary {
    pub fn from_records(records: &[ReviewRecord], now: DateTime<Utc>) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            if record.is_new() {
                summary.new_available += 1;
            } else if record.is_due(now) {
                summary.overdue += 1;
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.overdue + self.new_available
    }
}
