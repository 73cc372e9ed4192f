use anyhow::Result;

use crate::store::IssueStore;

pub fn run(store: &mut impl IssueStore, id: &str, author: &str, text: &str) -> Result<()> {
    let comment = store.add_comment(id, author, text)?;
    println!("Added comment {} to issue {}", comment.id, id);
    Ok(())
}
