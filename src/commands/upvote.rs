use anyhow::Result;

use crate::store::IssueStore;

pub fn run(store: &mut impl IssueStore, id: &str) -> Result<()> {
    let upvotes = store.upvote(id)?;
    println!("Upvoted issue {} ({} upvotes)", id, upvotes);
    Ok(())
}
