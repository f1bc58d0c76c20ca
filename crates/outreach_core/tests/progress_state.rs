use outreach_core::{ProgressState, RecordOutcome, Stage, StageResult, StageStatus};
use pretty_assertions::assert_eq;

fn summary(text: &str) -> StageResult {
    StageResult::Summary(text.to_string())
}

fn emails(list: &[&str]) -> StageResult {
    StageResult::Emails(list.iter().map(|s| s.to_string()).collect())
}

#[test]
fn new_state_has_every_stage_pending() {
    let snapshot = ProgressState::new().snapshot();
    for (_, status) in snapshot.iter() {
        assert_eq!(status, &StageStatus::Pending);
    }
    assert_eq!(snapshot.completed_count(), 0);
    assert!(!snapshot.is_complete());
}

#[test]
fn stages_complete_in_declared_order() {
    let mut state = ProgressState::new();

    let snapshot = state.record(Stage::SourceSummary, summary("Acme makes widgets"));
    assert_eq!(snapshot.summary(Stage::SourceSummary), Some("Acme makes widgets"));
    assert!(!snapshot.is_stage_complete(Stage::TargetSummary));
    assert!(!snapshot.is_stage_complete(Stage::Emails));

    let snapshot = state.record(Stage::TargetSummary, summary("Globex buys widgets"));
    assert_eq!(snapshot.summary(Stage::TargetSummary), Some("Globex buys widgets"));
    assert_eq!(snapshot.completed_count(), 2);

    let snapshot = state.record(Stage::Emails, emails(&["a@acme.com", "b@globex.com"]));
    assert!(snapshot.is_complete());
    assert_eq!(
        snapshot.emails(),
        Some(&["a@acme.com".to_string(), "b@globex.com".to_string()][..])
    );
}

#[test]
fn every_arrival_order_reaches_the_same_snapshot() {
    let updates = [
        (Stage::SourceSummary, summary("src")),
        (Stage::TargetSummary, summary("tgt")),
        (Stage::Emails, emails(&["x@y.z"])),
    ];
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    let mut reference = ProgressState::new();
    for (stage, result) in updates.iter().cloned() {
        reference.record(stage, result);
    }

    for order in orders {
        let mut state = ProgressState::new();
        for idx in order {
            let (stage, result) = updates[idx].clone();
            state.record(stage, result);
        }
        assert_eq!(state.snapshot(), reference.snapshot());
    }
}

#[test]
fn duplicate_event_leaves_snapshot_unchanged() {
    let mut state = ProgressState::new();
    let first = state.record(Stage::SourceSummary, summary("first"));

    assert_eq!(
        state.try_record(Stage::SourceSummary, summary("second")),
        RecordOutcome::AlreadyComplete
    );
    let after = state.record(Stage::SourceSummary, summary("third"));

    assert_eq!(after, first);
    assert_eq!(after.summary(Stage::SourceSummary), Some("first"));
}

#[test]
fn completed_stage_never_reverts() {
    let mut state = ProgressState::new();
    state.record(Stage::Emails, emails(&["a@acme.com"]));

    // Further traffic of any kind leaves the emails stage as it was.
    state.record(Stage::Emails, emails(&[]));
    state.record(Stage::SourceSummary, summary("late"));

    let snapshot = state.snapshot();
    assert!(snapshot.is_stage_complete(Stage::Emails));
    assert_eq!(snapshot.emails(), Some(&["a@acme.com".to_string()][..]));
}

#[test]
fn mismatched_payload_is_rejected() {
    let mut state = ProgressState::new();
    assert_eq!(
        state.try_record(Stage::Emails, summary("not a list")),
        RecordOutcome::Mismatched
    );
    assert_eq!(
        state.try_record(Stage::TargetSummary, emails(&["a@b.c"])),
        RecordOutcome::Mismatched
    );
    assert_eq!(state.snapshot().completed_count(), 0);
}

#[test]
fn snapshot_is_detached_from_later_updates() {
    let mut state = ProgressState::new();
    let before = state.snapshot();
    state.record(Stage::TargetSummary, summary("tgt"));
    assert_eq!(before.completed_count(), 0);
    assert_eq!(state.snapshot().completed_count(), 1);
}
