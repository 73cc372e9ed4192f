use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::models::{IssueStatus, NewIssue};
use crate::store::IssueStore;

struct DemoIssue {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    location: &'static str,
    reporter: &'static str,
    reported: (i32, u32, u32),
    image_id: &'static str,
    statuses: &'static [IssueStatus],
    comments: &'static [(&'static str, &'static str)],
    upvotes: u32,
}

const DEMO_ISSUES: &[DemoIssue] = &[
    DemoIssue {
        title: "Large pothole on MG Road",
        description: "Deep pothole near the bus stop, two-wheelers are swerving into traffic.",
        category: "Roads",
        location: "MG Road, near Central Bus Stop",
        reporter: "Rajesh Kumar",
        reported: (2024, 1, 2),
        image_id: "pothole-1",
        statuses: &[IssueStatus::InProgress, IssueStatus::Resolved],
        comments: &[("Priya Sharma", "Nearly fell off my scooter here yesterday.")],
        upvotes: 24,
    },
    DemoIssue {
        title: "Streetlights not working in Sector 5",
        description: "Entire lane has been dark for a week.",
        category: "Electricity",
        location: "Sector 5, Lane 3",
        reporter: "Rajesh Kumar",
        reported: (2024, 1, 10),
        image_id: "streetlight-1",
        statuses: &[IssueStatus::InProgress],
        comments: &[],
        upvotes: 11,
    },
    DemoIssue {
        title: "Garbage not collected for days",
        description: "Bins overflowing next to the market entrance.",
        category: "Sanitation",
        location: "Old Market Square",
        reporter: "Priya Sharma",
        reported: (2024, 1, 12),
        image_id: "garbage-1",
        statuses: &[],
        comments: &[
            ("Amit Patel", "Same problem on the east side."),
            ("Rajesh Kumar", "Smell is unbearable in the evenings."),
        ],
        upvotes: 37,
    },
    DemoIssue {
        title: "Water pipeline leak",
        description: "Clean water running into the drain since morning.",
        category: "Water",
        location: "Gandhi Nagar, Block C",
        reporter: "Amit Patel",
        reported: (2024, 1, 15),
        image_id: "water-leak-1",
        statuses: &[IssueStatus::InProgress],
        comments: &[],
        upvotes: 8,
    },
];

/// Loads the demo dataset into an empty store.
pub fn run(store: &mut impl IssueStore) -> Result<()> {
    if !store.all()?.is_empty() {
        bail!("Store already has issues; seed only runs on an empty database");
    }

    for demo in DEMO_ISSUES {
        let (y, m, d) = demo.reported;
        let issue = store.create(NewIssue {
            title: demo.title.to_string(),
            description: demo.description.to_string(),
            category: demo.category.to_string(),
            location: demo.location.to_string(),
            reporter: demo.reporter.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d),
            image_id: Some(demo.image_id.to_string()),
        })?;

        for status in demo.statuses {
            store.update_status(&issue.id, *status)?;
        }
        for (author, text) in demo.comments {
            store.add_comment(&issue.id, author, text)?;
        }
        for _ in 0..demo.upvotes {
            store.upvote(&issue.id)?;
        }
    }

    println!("Seeded {} demo issues", DEMO_ISSUES.len());
    Ok(())
}
