//! Notification feed derived from issue timelines.
//!
//! A viewer is notified of every non-Open status their own issues have
//! passed through. Nothing is cached; the feed is recomputed from the
//! current issues on each call.

use crate::error::StoreResult;
use crate::models::{Issue, IssueStatus, Notification};
use crate::store::IssueStore;

/// Notification ids are `<issue id>-<date>`, so two non-Open transitions of
/// one issue on the same day share an id.
pub fn derive_for(issues: &[Issue], viewer: &str) -> Vec<Notification> {
    let mut notifications: Vec<Notification> = issues
        .iter()
        .filter(|issue| issue.reporter == viewer)
        .flat_map(|issue| {
            issue
                .timeline
                .iter()
                .filter(|entry| entry.status != IssueStatus::Open)
                .map(move |entry| Notification {
                    id: format!("{}-{}", issue.id, entry.date.format("%Y-%m-%d")),
                    issue_id: issue.id.clone(),
                    title: issue.title.clone(),
                    status: entry.status,
                    date: entry.date,
                })
        })
        .collect();

    // stable: equal dates keep issue order, then timeline order
    notifications.sort_by(|a, b| b.date.cmp(&a.date));
    notifications
}

pub fn derive_from_store<S: IssueStore + ?Sized>(
    store: &S,
    viewer: &str,
) -> StoreResult<Vec<Notification>> {
    let issues = store.all()?;
    Ok(derive_for(&issues, viewer))
}
