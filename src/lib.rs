//! Issue lifecycle and notification core for a civic issue tracker.
//!
//! Citizens report issues, administrators move them through
//! Open / In Progress / Resolved, and participants comment and upvote.
//! Reporters get a notification feed derived from the status history of
//! their own issues.

pub mod access;
pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod store;

pub use access::AccessPolicy;
pub use db::SqliteStore;
pub use error::{StoreError, StoreResult};
pub use models::{Comment, ImageRef, Issue, IssueFilter, IssueStatus, NewIssue, Notification, TimelineEntry};
pub use store::{IssueStore, MemoryStore};
