#![no_main]

//! Fuzz target for issue store operation sequences.
//!
//! Drives random report / status / comment / upvote calls against the
//! SQLite store and checks that every issue keeps a timeline that starts
//! at Open and ends at its current status, and that notifications never
//! report an Open status.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use civic::models::{IssueStatus, NewIssue};
use civic::notifications::derive_for;
use civic::store::IssueStore;
use civic::SqliteStore;

#[derive(Arbitrary, Debug)]
enum Op {
    Report { title: String, reporter: u8 },
    SetStatus { issue: u8, status: u8 },
    Comment { issue: u8, text: String },
    Upvote { issue: u8 },
}

const REPORTERS: [&str; 3] = ["Asha", "Bob", "Chitra"];

fuzz_target!(|ops: Vec<Op>| {
    let dir = match tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let mut store = match SqliteStore::open(&dir.path().join("issues.db")) {
        Ok(s) => s,
        Err(_) => return,
    };

    let mut ids: Vec<String> = Vec::new();
    let mut expected_upvotes: Vec<u32> = Vec::new();

    for op in ops.into_iter().take(64) {
        match op {
            Op::Report { title, reporter } => {
                let new = NewIssue {
                    title,
                    category: "Fuzz".to_string(),
                    reporter: REPORTERS[reporter as usize % REPORTERS.len()].to_string(),
                    ..Default::default()
                };
                if let Ok(issue) = store.create(new) {
                    ids.push(issue.id);
                    expected_upvotes.push(0);
                }
            }
            Op::SetStatus { issue, status } => {
                if ids.is_empty() {
                    continue;
                }
                let id = &ids[issue as usize % ids.len()];
                let status = IssueStatus::ALL[status as usize % IssueStatus::ALL.len()];
                let updated = store.update_status(id, status).expect("existing issue");
                assert_eq!(updated.status, status);
            }
            Op::Comment { issue, text } => {
                if ids.is_empty() {
                    continue;
                }
                let id = &ids[issue as usize % ids.len()];
                let before = store.find(id).expect("existing issue").comments.len();
                let result = store.add_comment(id, "fuzzer", &text);
                let after = store.find(id).expect("existing issue").comments.len();
                if text.trim().is_empty() {
                    assert!(result.is_err());
                    assert_eq!(after, before);
                } else {
                    assert!(result.is_ok());
                    assert_eq!(after, before + 1);
                }
            }
            Op::Upvote { issue } => {
                if ids.is_empty() {
                    continue;
                }
                let idx = issue as usize % ids.len();
                expected_upvotes[idx] += 1;
                let count = store.upvote(&ids[idx]).expect("existing issue");
                assert_eq!(count, expected_upvotes[idx]);
            }
        }
    }

    let issues = store.all().expect("list issues");
    for issue in &issues {
        assert!(issue.validate().is_ok(), "invariant broken for {}", issue.id);
    }
    for reporter in REPORTERS {
        let feed = derive_for(&issues, reporter);
        assert!(feed.iter().all(|n| n.status != IssueStatus::Open));
        assert!(feed.windows(2).all(|w| w[0].date >= w[1].date));
    }
});
