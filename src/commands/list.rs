use anyhow::Result;

use crate::models::IssueFilter;
use crate::store::IssueStore;

pub fn run(store: &impl IssueStore, filter: &IssueFilter) -> Result<()> {
    let issues = store.list(filter)?;

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    for issue in issues {
        let status_display = format!("[{}]", issue.status);
        println!(
            "{:<8} {:13} {:<40} {:<12} {:>3} up {:>3} comments  {}",
            issue.id,
            status_display,
            truncate(&issue.title, 40),
            truncate(&issue.category, 12),
            issue.upvotes,
            issue.comments.len(),
            issue.date.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
