use anyhow::{bail, Result};
use tracing::warn;

use crate::access::AccessPolicy;
use crate::models::IssueStatus;
use crate::store::IssueStore;

/// Admin-only status change. A change to the status the issue already has
/// is refused here; the store itself would append it.
pub fn run(
    store: &mut impl IssueStore,
    policy: &AccessPolicy,
    role: &str,
    id: &str,
    status: IssueStatus,
) -> Result<()> {
    if let Err(e) = policy.ensure_can_manage(role) {
        warn!(role, issue = id, "management action denied");
        return Err(e);
    }

    let issue = store.find(id)?;
    if issue.status == status {
        bail!("Issue {} is already {}", id, status);
    }

    let updated = store.update_status(id, status)?;
    println!(
        "Issue status has been changed to \"{}\" ({} -> {})",
        updated.status, issue.status, updated.status
    );
    Ok(())
}
