use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Resolved")]
    Resolved,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(IssueStatus::Open),
            "in progress" | "in-progress" | "in_progress" | "inprogress" => {
                Ok(IssueStatus::InProgress)
            }
            "resolved" => Ok(IssueStatus::Resolved),
            _ => Err(StoreError::InvalidInput(format!(
                "Invalid status '{}'. Must be one of: Open, In Progress, Resolved",
                s
            ))),
        }
    }
}

/// Reference to a display asset. Resolving it to a URL is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub fallback_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: IssueStatus,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub avatar: String,
    pub text: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub reporter: String,
    pub date: NaiveDate,
    pub status: IssueStatus,
    pub image: ImageRef,
    pub upvotes: u32,
    pub comments: Vec<Comment>,
    pub timeline: Vec<TimelineEntry>,
}

impl Issue {
    /// Checks the lifecycle invariants: a non-empty timeline that starts
    /// at Open and ends at the current status.
    pub fn validate(&self) -> Result<(), StoreError> {
        let (Some(first), Some(last)) = (self.timeline.first(), self.timeline.last()) else {
            return Err(StoreError::InvalidInput(format!(
                "Issue {} has an empty timeline",
                self.id
            )));
        };
        if first.status != IssueStatus::Open {
            return Err(StoreError::InvalidInput(format!(
                "Issue {} timeline must start at Open, found {}",
                self.id, first.status
            )));
        }
        if last.status != self.status {
            return Err(StoreError::InvalidInput(format!(
                "Issue {} status {} does not match last timeline entry {}",
                self.id, self.status, last.status
            )));
        }
        Ok(())
    }
}

/// Input for the reporting flow.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub reporter: String,
    pub date: Option<NaiveDate>,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<String>,
    pub reporter: Option<String>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !issue.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(reporter) = &self.reporter {
            if &issue.reporter != reporter {
                return false;
            }
        }
        true
    }
}

/// Derived from an issue's timeline; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub issue_id: String,
    pub title: String,
    pub status: IssueStatus,
    pub date: NaiveDate,
}

impl Notification {
    pub fn message(&self) -> String {
        format!(
            "Your issue \"{}\" has been updated to {}.",
            self.title, self.status
        )
    }
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn default_avatar(author: &str) -> String {
    format!("https://i.pravatar.cc/150?u={}", author)
}

pub fn default_image(issue_id: &str, image_id: Option<&str>) -> ImageRef {
    ImageRef {
        id: image_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("issue-{}", issue_id)),
        fallback_url: format!("https://picsum.photos/seed/{}/800/600", issue_id),
    }
}
