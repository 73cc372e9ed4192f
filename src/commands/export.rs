use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use crate::models::{Issue, IssueStatus};
use crate::store::IssueStore;

pub const EXPORT_VERSION: i32 = 1;

#[derive(Serialize, Deserialize)]
pub struct ExportData {
    pub version: i32,
    pub exported_at: String,
    pub issues: Vec<Issue>,
}

fn write_output(content: &str, count: usize, output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some(path) => {
            fs::write(path, content).context("Failed to write export file")?;
            eprintln!("Exported {} issues to {}", count, path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", content)?;
        }
    }
    Ok(())
}

pub fn run_json(store: &impl IssueStore, output_path: Option<&str>) -> Result<()> {
    let data = ExportData {
        version: EXPORT_VERSION,
        exported_at: chrono::Utc::now().to_rfc3339(),
        issues: store.all()?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    write_output(&json, data.issues.len(), output_path)
}

pub fn run_markdown(store: &impl IssueStore, output_path: Option<&str>) -> Result<()> {
    let issues = store.all()?;
    let mut md = String::new();

    md.push_str("# Civic Issues Export\n\n");
    md.push_str(&format!(
        "Exported: {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for status in IssueStatus::ALL {
        let group: Vec<&Issue> = issues.iter().filter(|i| i.status == status).collect();
        if group.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", status));
        for issue in group {
            write_issue_md(&mut md, issue);
        }
    }

    write_output(&md, issues.len(), output_path)
}

fn write_issue_md(md: &mut String, issue: &Issue) {
    let checkbox = if issue.status == IssueStatus::Resolved {
        "[x]"
    } else {
        "[ ]"
    };

    md.push_str(&format!("### {} {}: {}\n\n", checkbox, issue.id, issue.title));
    md.push_str(&format!("- **Category:** {}\n", issue.category));
    if !issue.location.is_empty() {
        md.push_str(&format!("- **Location:** {}\n", issue.location));
    }
    md.push_str(&format!(
        "- **Reported:** {} by {}\n",
        issue.date.format("%Y-%m-%d"),
        issue.reporter
    ));
    md.push_str(&format!("- **Upvotes:** {}\n", issue.upvotes));

    if !issue.description.is_empty() {
        md.push_str(&format!("\n{}\n", issue.description));
    }

    md.push_str("\n**Timeline:**\n");
    for entry in &issue.timeline {
        md.push_str(&format!(
            "- {} {}\n",
            entry.date.format("%Y-%m-%d"),
            entry.status
        ));
    }

    if !issue.comments.is_empty() {
        md.push_str("\n**Comments:**\n");
        for comment in &issue.comments {
            md.push_str(&format!(
                "- [{}] {}: {}\n",
                comment.date.format("%Y-%m-%d"),
                comment.author,
                comment.text
            ));
        }
    }

    md.push_str("\n---\n\n");
}
