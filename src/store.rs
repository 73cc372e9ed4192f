//! The issue store contract and its in-memory implementation.
//!
//! All issue mutation goes through [`IssueStore`]. Callers receive owned
//! copies of issues, so editing a returned [`Issue`] never changes the
//! stored record.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    default_avatar, default_image, today, Comment, Issue, IssueFilter, IssueStatus, NewIssue,
    TimelineEntry,
};

pub trait IssueStore {
    /// Reporting flow: stores a new Open issue with a single timeline entry.
    fn create(&mut self, new: NewIssue) -> StoreResult<Issue>;

    fn find(&self, id: &str) -> StoreResult<Issue>;

    /// Newest first: reported date descending, then most recently created.
    fn list(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>>;

    fn all(&self) -> StoreResult<Vec<Issue>> {
        self.list(&IssueFilter::default())
    }

    /// Sets the status and appends `{status, today}` to the timeline. The
    /// entry is appended even when the status is unchanged.
    fn update_status(&mut self, id: &str, status: IssueStatus) -> StoreResult<Issue>;

    fn add_comment(&mut self, id: &str, author: &str, text: &str) -> StoreResult<Comment>;

    /// Returns the new upvote count.
    fn upvote(&mut self, id: &str) -> StoreResult<u32>;
}

pub(crate) fn validate_new_issue(new: &NewIssue) -> StoreResult<()> {
    let required = [
        ("title", &new.title),
        ("category", &new.category),
        ("reporter", &new.reporter),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(StoreError::InvalidInput(format!("{} must not be empty", field)));
        }
    }
    Ok(())
}

pub(crate) fn validate_comment_text(text: &str) -> StoreResult<()> {
    if text.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "comment text must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn upvote_limit(id: &str) -> StoreError {
    StoreError::InvalidInput(format!("issue {} has reached the upvote limit", id))
}

/// Expects `issues` in creation order; same-day issues come out most
/// recently created first.
pub(crate) fn sort_newest_first(issues: &mut [Issue]) {
    issues.reverse();
    issues.sort_by(|a, b| b.date.cmp(&a.date));
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    issues: Vec<Issue>,
    next_issue: u64,
    next_comment: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from an existing dataset. Every issue must satisfy the
    /// lifecycle invariants and ids must be unique.
    pub fn from_issues(issues: Vec<Issue>) -> StoreResult<Self> {
        {
            let mut seen = HashSet::new();
            for issue in &issues {
                issue.validate()?;
                if !seen.insert(issue.id.as_str()) {
                    return Err(StoreError::InvalidInput(format!(
                        "duplicate issue id {}",
                        issue.id
                    )));
                }
            }
        }
        let comment_count: usize = issues.iter().map(|i| i.comments.len()).sum();
        Ok(MemoryStore {
            next_issue: issues.len() as u64,
            next_comment: comment_count as u64,
            issues,
        })
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn get_mut(&mut self, id: &str) -> StoreResult<&mut Issue> {
        self.issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn fresh_issue_id(&mut self) -> String {
        loop {
            self.next_issue += 1;
            let candidate = format!("ISS-{}", self.next_issue);
            if !self.issues.iter().any(|i| i.id == candidate) {
                return candidate;
            }
        }
    }

    fn fresh_comment_id(&mut self) -> String {
        loop {
            self.next_comment += 1;
            let candidate = format!("c{}", self.next_comment);
            let taken = self
                .issues
                .iter()
                .flat_map(|i| i.comments.iter())
                .any(|c| c.id == candidate);
            if !taken {
                return candidate;
            }
        }
    }
}

impl IssueStore for MemoryStore {
    fn create(&mut self, new: NewIssue) -> StoreResult<Issue> {
        validate_new_issue(&new)?;
        let id = self.fresh_issue_id();
        let date = new.date.unwrap_or_else(today);
        let issue = Issue {
            image: default_image(&id, new.image_id.as_deref()),
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            location: new.location,
            reporter: new.reporter,
            date,
            status: IssueStatus::Open,
            upvotes: 0,
            comments: Vec::new(),
            timeline: vec![TimelineEntry {
                status: IssueStatus::Open,
                date,
            }],
        };
        info!(issue = %issue.id, reporter = %issue.reporter, "issue reported");
        self.issues.push(issue.clone());
        Ok(issue)
    }

    fn find(&self, id: &str) -> StoreResult<Issue> {
        self.issues
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>> {
        let mut issues: Vec<Issue> = self
            .issues
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        sort_newest_first(&mut issues);
        Ok(issues)
    }

    fn update_status(&mut self, id: &str, status: IssueStatus) -> StoreResult<Issue> {
        let issue = self.get_mut(id)?;
        let previous = issue.status;
        issue.status = status;
        issue.timeline.push(TimelineEntry {
            status,
            date: today(),
        });
        info!(issue = %id, from = %previous, to = %status, "status updated");
        Ok(issue.clone())
    }

    fn add_comment(&mut self, id: &str, author: &str, text: &str) -> StoreResult<Comment> {
        validate_comment_text(text)?;
        // resolve before consuming an id so a miss leaves the counter alone
        self.get_mut(id)?;
        let comment = Comment {
            id: self.fresh_comment_id(),
            author: author.to_string(),
            avatar: default_avatar(author),
            text: text.to_string(),
            date: today(),
        };
        let issue = self.get_mut(id)?;
        issue.comments.push(comment.clone());
        debug!(issue = %id, comment = %comment.id, "comment added");
        Ok(comment)
    }

    fn upvote(&mut self, id: &str) -> StoreResult<u32> {
        let issue = self.get_mut(id)?;
        issue.upvotes = issue.upvotes.checked_add(1).ok_or_else(|| upvote_limit(id))?;
        debug!(issue = %id, upvotes = issue.upvotes, "upvoted");
        Ok(issue.upvotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_issue(title: &str, reporter: &str) -> NewIssue {
        NewIssue {
            title: title.to_string(),
            description: "Needs attention".to_string(),
            category: "Roads".to_string(),
            location: "Ward 4".to_string(),
            reporter: reporter.to_string(),
            date: Some(date(2024, 1, 1)),
            image_id: None,
        }
    }

    fn setup_store() -> (MemoryStore, String) {
        let mut store = MemoryStore::new();
        let issue = store.create(new_issue("Pothole on Main St", "Asha")).unwrap();
        (store, issue.id)
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_create_starts_open_with_single_entry() {
        let (store, id) = setup_store();
        let issue = store.find(&id).unwrap();
        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(
            issue.timeline,
            vec![TimelineEntry {
                status: IssueStatus::Open,
                date: date(2024, 1, 1)
            }]
        );
        assert_eq!(issue.upvotes, 0);
        assert!(issue.comments.is_empty());
        assert_eq!(issue.image.fallback_url, format!("https://picsum.photos/seed/{}/800/600", id));
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut store = MemoryStore::new();
        let err = store.create(new_issue("   ", "Asha")).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_generates_unique_ids() {
        let mut store = MemoryStore::new();
        let a = store.create(new_issue("A", "Asha")).unwrap();
        let b = store.create(new_issue("B", "Asha")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_find_missing() {
        let store = MemoryStore::new();
        assert!(store.find("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_status_appends_timeline() {
        let (mut store, id) = setup_store();
        store.update_status(&id, IssueStatus::InProgress).unwrap();

        let issue = store.find(&id).unwrap();
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(
            issue.timeline,
            vec![
                TimelineEntry {
                    status: IssueStatus::Open,
                    date: date(2024, 1, 1)
                },
                TimelineEntry {
                    status: IssueStatus::InProgress,
                    date: today()
                },
            ]
        );
    }

    #[test]
    fn test_update_status_same_status_still_appends() {
        let (mut store, id) = setup_store();
        store.update_status(&id, IssueStatus::Open).unwrap();
        assert_eq!(store.find(&id).unwrap().timeline.len(), 2);
    }

    #[test]
    fn test_update_status_missing() {
        let mut store = MemoryStore::new();
        let err = store.update_status("nope", IssueStatus::Resolved).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_add_comment() {
        let (mut store, id) = setup_store();
        let comment = store.add_comment(&id, "Bob", "Saw this too").unwrap();
        assert_eq!(comment.author, "Bob");
        assert_eq!(comment.avatar, "https://i.pravatar.cc/150?u=Bob");
        assert_eq!(comment.date, today());

        let issue = store.find(&id).unwrap();
        assert_eq!(issue.comments, vec![comment]);
    }

    #[test]
    fn test_add_empty_comment_leaves_store_unchanged() {
        let (mut store, id) = setup_store();
        let before = store.find(&id).unwrap();

        let err = store.add_comment(&id, "Bob", "").unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(store.find(&id).unwrap(), before);
    }

    #[test]
    fn test_add_whitespace_comment_fails() {
        let (mut store, id) = setup_store();
        assert!(store.add_comment(&id, "Bob", " \n\t ").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_add_comment_missing_issue() {
        let mut store = MemoryStore::new();
        assert!(store.add_comment("nope", "Bob", "hi").unwrap_err().is_not_found());
    }

    #[test]
    fn test_comment_ids_unique_across_issues() {
        let mut store = MemoryStore::new();
        let a = store.create(new_issue("A", "Asha")).unwrap();
        let b = store.create(new_issue("B", "Asha")).unwrap();
        let c1 = store.add_comment(&a.id, "Bob", "one").unwrap();
        let c2 = store.add_comment(&b.id, "Bob", "two").unwrap();
        let c3 = store.add_comment(&a.id, "Bob", "three").unwrap();
        assert_ne!(c1.id, c2.id);
        assert_ne!(c1.id, c3.id);
        assert_ne!(c2.id, c3.id);
    }

    #[test]
    fn test_upvote() {
        let (mut store, id) = setup_store();
        assert_eq!(store.upvote(&id).unwrap(), 1);
        assert_eq!(store.upvote(&id).unwrap(), 2);
        assert_eq!(store.find(&id).unwrap().upvotes, 2);
    }

    #[test]
    fn test_upvote_at_limit_is_rejected() {
        let (store, id) = setup_store();
        let mut issue = store.find(&id).unwrap();
        issue.upvotes = u32::MAX;
        let mut store = MemoryStore::from_issues(vec![issue]).unwrap();

        let err = store.upvote(&id).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(store.find(&id).unwrap().upvotes, u32::MAX);
    }

    #[test]
    fn test_same_day_ties_follow_creation_order() {
        let (store, id) = setup_store();
        let first = store.find(&id).unwrap();
        let mut second = first.clone();
        second.id = "ISS-10".to_string();
        let mut third = first.clone();
        third.id = "ISS-9".to_string();

        let store = MemoryStore::from_issues(vec![first, second, third]).unwrap();
        let ids: Vec<String> = store.all().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["ISS-9", "ISS-10", id.as_str()]);
    }

    #[test]
    fn test_upvote_missing() {
        let mut store = MemoryStore::new();
        assert!(store.upvote("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_returned_issue_is_a_copy() {
        let (store, id) = setup_store();
        let mut copy = store.find(&id).unwrap();
        copy.status = IssueStatus::Resolved;
        copy.upvotes = 99;
        assert_eq!(store.find(&id).unwrap().status, IssueStatus::Open);
        assert_eq!(store.find(&id).unwrap().upvotes, 0);
    }

    #[test]
    fn test_list_filters_and_orders() {
        let mut store = MemoryStore::new();
        let mut older = new_issue("Older", "Asha");
        older.date = Some(date(2024, 1, 1));
        let mut newer = new_issue("Newer", "Bob");
        newer.date = Some(date(2024, 2, 1));
        let older = store.create(older).unwrap();
        let newer = store.create(newer).unwrap();
        store.update_status(&older.id, IssueStatus::Resolved).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);

        let resolved = store
            .list(&IssueFilter {
                status: Some(IssueStatus::Resolved),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, older.id);

        let bobs = store
            .list(&IssueFilter {
                reporter: Some("Bob".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, newer.id);
    }

    #[test]
    fn test_from_issues_rejects_broken_invariants() {
        let (store, id) = setup_store();
        let mut issue = store.find(&id).unwrap();
        issue.status = IssueStatus::Resolved;
        assert!(MemoryStore::from_issues(vec![issue]).is_err());
    }

    #[test]
    fn test_from_issues_rejects_duplicate_ids() {
        let (store, id) = setup_store();
        let issue = store.find(&id).unwrap();
        let err = MemoryStore::from_issues(vec![issue.clone(), issue]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_from_issues_does_not_reuse_ids() {
        let (mut store, id) = setup_store();
        store.add_comment(&id, "Bob", "first").unwrap();
        let seeded = store.all().unwrap();

        let mut reseeded = MemoryStore::from_issues(seeded).unwrap();
        let created = reseeded.create(new_issue("Another", "Asha")).unwrap();
        assert_ne!(created.id, id);
        let comment = reseeded.add_comment(&id, "Bob", "second").unwrap();
        let issue = reseeded.find(&id).unwrap();
        assert_eq!(issue.comments.len(), 2);
        assert_ne!(issue.comments[0].id, comment.id);
    }

    // ==================== Property-Based Tests ====================

    fn status_strategy() -> impl Strategy<Value = IssueStatus> {
        prop::sample::select(IssueStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_timeline_tracks_status(statuses in prop::collection::vec(status_strategy(), 0..10)) {
            let (mut store, id) = setup_store();
            for status in &statuses {
                store.update_status(&id, *status).unwrap();
                let issue = store.find(&id).unwrap();
                prop_assert!(issue.validate().is_ok());
                prop_assert_eq!(issue.status, *status);
            }
            let issue = store.find(&id).unwrap();
            prop_assert_eq!(issue.timeline.len(), statuses.len() + 1);
        }

        #[test]
        fn prop_comment_count_grows_by_one(texts in prop::collection::vec("[a-zA-Z0-9 ]{0,20}", 1..10)) {
            let (mut store, id) = setup_store();
            for text in &texts {
                let before = store.find(&id).unwrap().comments.len();
                let result = store.add_comment(&id, "Bob", text);
                let after = store.find(&id).unwrap().comments.len();
                if text.trim().is_empty() {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(after, before);
                } else {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(after, before + 1);
                }
            }
        }

        #[test]
        fn prop_upvotes_count_exactly(n in 1u32..50) {
            let (mut store, id) = setup_store();
            for expected in 1..=n {
                prop_assert_eq!(store.upvote(&id).unwrap(), expected);
            }
            prop_assert_eq!(store.find(&id).unwrap().upvotes, n);
        }
    }
}
