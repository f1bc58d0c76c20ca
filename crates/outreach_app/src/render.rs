//! Plain-text rendering of the view model.

use std::fmt::Write as _;

use outreach_core::{
    Company, ProgressSnapshot, SessionKey, SessionPhase, Stage, StageResult, StageStatus,
};

const DONE: &str = "[x]";
const PENDING: &str = "[ ]";

pub fn header(key: &SessionKey) -> String {
    format!("Streaming {} -> {}\n", key.source(), key.target())
}

/// One stage block: marker and title, then the payload once it has arrived.
pub fn stage(stage: Stage, status: &StageStatus) -> String {
    let mut out = String::new();
    match status.result() {
        None => {
            let _ = writeln!(out, "{PENDING} {}", stage.title());
        }
        Some(result) => {
            let _ = writeln!(out, "{DONE} {}", stage.title());
            match result {
                StageResult::Summary(text) => {
                    for line in text.lines() {
                        let _ = writeln!(out, "    {line}");
                    }
                }
                StageResult::Emails(emails) if emails.is_empty() => {
                    let _ = writeln!(out, "    (no emails found)");
                }
                StageResult::Emails(emails) => {
                    for email in emails {
                        let _ = writeln!(out, "    - {email}");
                    }
                }
            }
        }
    }
    out
}

pub fn progress(snapshot: &ProgressSnapshot) -> String {
    snapshot
        .iter()
        .map(|(s, status)| stage(s, status))
        .collect()
}

/// Closing line for a settled run.
pub fn outcome(phase: &SessionPhase, snapshot: &ProgressSnapshot) -> String {
    let done = snapshot.completed_count();
    let total = Stage::ALL.len();
    match phase {
        SessionPhase::Complete => format!("Done ({done}/{total} stages).\n"),
        SessionPhase::Failed { message } => {
            format!("Failed after {done}/{total} stages: {message}\n")
        }
        SessionPhase::Cancelled => format!("Cancelled after {done}/{total} stages.\n"),
        SessionPhase::Idle | SessionPhase::Streaming => String::new(),
    }
}

pub fn companies(companies: &[Company]) -> String {
    if companies.is_empty() {
        return "No companies found.\n".to_string();
    }
    companies
        .iter()
        .map(|c| format!("{} ({})\n", c.name, c.domain))
        .collect()
}
