use anyhow::Result;

use crate::models::NewIssue;
use crate::store::IssueStore;

pub fn run(store: &mut impl IssueStore, new: NewIssue) -> Result<()> {
    let issue = store.create(new)?;
    println!("Reported issue {}: {}", issue.id, issue.title);
    Ok(())
}
