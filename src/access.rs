use anyhow::{bail, Result};

pub const ADMIN_ROLE: &str = "admin";

/// Decides whether a role token may use management actions. The token is
/// supplied by the caller's session; nothing here reads ambient state.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_marker: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        AccessPolicy {
            admin_marker: ADMIN_ROLE.to_string(),
        }
    }
}

impl AccessPolicy {
    pub fn new(admin_marker: &str) -> Self {
        AccessPolicy {
            admin_marker: admin_marker.to_string(),
        }
    }

    /// Exact, case-sensitive match against the administrator marker.
    pub fn can_manage(&self, role_token: &str) -> bool {
        !role_token.is_empty() && role_token == self.admin_marker
    }

    pub fn ensure_can_manage(&self, role_token: &str) -> Result<()> {
        if !self.can_manage(role_token) {
            bail!(
                "Permission denied: role '{}' cannot manage issues",
                role_token
            );
        }
        Ok(())
    }
}
