use anyhow::Result;

use crate::access::AccessPolicy;
use crate::store::IssueStore;

pub fn run(store: &impl IssueStore, policy: &AccessPolicy, role: &str, id: &str) -> Result<()> {
    let issue = store.find(id)?;

    println!("Issue {}: {}", issue.id, issue.title);
    println!("Status: {}", issue.status);
    println!("Category: {}", issue.category);
    if !issue.location.is_empty() {
        println!("Location: {}", issue.location);
    }
    println!(
        "Reported by {} on {}",
        issue.reporter,
        issue.date.format("%Y-%m-%d")
    );
    println!("Image: {} ({})", issue.image.id, issue.image.fallback_url);
    println!("Upvotes: {}", issue.upvotes);

    if !issue.description.is_empty() {
        println!("\nDescription:");
        for line in issue.description.lines() {
            println!("  {}", line);
        }
    }

    println!("\nTimeline:");
    for entry in &issue.timeline {
        println!("  {}  {}", entry.date.format("%Y-%m-%d"), entry.status);
    }

    println!("\nComments ({}):", issue.comments.len());
    if issue.comments.is_empty() {
        println!("  No comments yet.");
    }
    for comment in &issue.comments {
        println!(
            "  [{}] {}: {}",
            comment.date.format("%Y-%m-%d"),
            comment.author,
            comment.text
        );
    }

    if policy.can_manage(role) {
        println!("\nManage: civic manage {} <open|in-progress|resolved>", issue.id);
    }

    Ok(())
}
