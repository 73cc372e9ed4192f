use anyhow::Result;

use crate::notifications::derive_from_store;
use crate::store::IssueStore;

pub fn run(store: &impl IssueStore, viewer: &str) -> Result<()> {
    let notifications = derive_from_store(store, viewer)?;

    println!("Notifications for {} ({})", viewer, notifications.len());

    if notifications.is_empty() {
        println!("  No new notifications");
        return Ok(());
    }

    for notification in &notifications {
        println!(
            "  {}  {}  {}",
            notification.date.format("%Y-%m-%d"),
            notification.issue_id,
            notification.message()
        );
    }

    Ok(())
}
