use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::control::{OperatorAction, operator_channel};
use super::engine::{Classification, DecisionEngine, EngineSignal, JudgmentContext};
use super::outcome::{QualificationOutcome, RejectReason};
use super::state::CycleState;
use super::Cancelled;
use crate::config::{QueryThresholds, SpeedupPolicy};
use crate::document::Document;
use crate::oracle::{MockOracle, MockResponse, OracleVerdict};
use crate::scoring::{RuleScore, ScoreResult};

fn passing() -> ScoreResult {
    ScoreResult::evaluate(0.8, RuleScore::default(), 0.45, 0.40)
}

fn failing() -> ScoreResult {
    ScoreResult::evaluate(0.1, RuleScore::default(), 0.45, 0.40)
}

fn policy(sample_size: u32, target: f32, fail_fast: bool) -> SpeedupPolicy {
    SpeedupPolicy {
        sample_size,
        target_qualify_rate: target,
        fail_fast,
    }
}

fn engine(policy: SpeedupPolicy, oracle: Arc<MockOracle>) -> DecisionEngine {
    DecisionEngine::new(policy, oracle, Duration::from_millis(200))
}

fn doc(id: &str) -> Document {
    Document::new(id, format!("Title {}", id), "Abstract text")
}

fn ctx<'a>(topics: &'a [String], cancel: &'a CancellationToken) -> JudgmentContext<'a> {
    JudgmentContext {
        topics,
        thresholds: QueryThresholds::default(),
        cancel,
        overrides: None,
    }
}

fn state(processed: u32, qualified: u32) -> CycleState {
    CycleState {
        processed,
        qualified,
        ..Default::default()
    }
}

#[test]
fn test_yield_is_zero_before_processing() {
    let state = CycleState::new();
    assert_eq!(state.current_yield(), 0.0);
    assert_eq!(state.snapshot().yield_rate, 0.0);
}

#[test]
fn test_classify_filtered_does_not_count() {
    let engine = engine(policy(10, 0.5, true), Arc::new(MockOracle::default()));
    let mut state = state(3, 1);

    assert_eq!(engine.classify(&mut state, &failing()), Classification::FilteredOut);
    assert_eq!(state.processed(), 3);
    assert_eq!(state.qualified(), 1);
}

#[test]
fn test_classify_first_document_is_judged_even_at_full_yield() {
    let engine = engine(policy(1, 0.0, false), Arc::new(MockOracle::default()));
    let mut state = CycleState::new();

    assert_eq!(engine.classify(&mut state, &passing()), Classification::Judge);
    assert_eq!(state.processed(), 1);
    assert!(!state.is_speedup_locked());
}

#[test]
fn test_classify_fail_fast_at_sample_size() {
    let engine = engine(policy(10, 0.5, true), Arc::new(MockOracle::default()));
    let mut state = state(9, 0);

    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::AbortedLowYield {
            newly_triggered: true
        }
    );
    assert!(state.is_fail_fast_triggered());
    assert_eq!(state.processed(), 10);

    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::AbortedLowYield {
            newly_triggered: false
        }
    );
    assert_eq!(state.processed(), 11);
}

#[test]
fn test_classify_fail_fast_disabled_keeps_judging() {
    let engine = engine(policy(10, 0.5, false), Arc::new(MockOracle::default()));
    let mut state = state(9, 0);

    assert_eq!(engine.classify(&mut state, &passing()), Classification::Judge);
    assert!(!state.is_fail_fast_triggered());
}

#[test]
fn test_classify_fast_path_locks_once() {
    let engine = engine(policy(10, 0.5, true), Arc::new(MockOracle::default()));
    let mut state = state(5, 3);

    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::FastPath {
            newly_activated: true
        }
    );
    assert!(state.is_speedup_locked());
    assert_eq!(state.qualified(), 4);

    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::FastPath {
            newly_activated: false
        }
    );
    assert_eq!(state.processed(), 7);
    assert_eq!(state.qualified(), 5);
}

#[test]
fn test_classify_locked_fast_path_is_never_aborted() {
    let engine = engine(policy(2, 0.5, true), Arc::new(MockOracle::default()));
    let mut state = CycleState {
        processed: 1,
        qualified: 0,
        speedup_locked: true,
        fail_fast_triggered: false,
    };

    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::FastPath {
            newly_activated: false
        }
    );
}

#[test]
fn test_classify_below_target_is_judged() {
    let engine = engine(policy(10, 0.5, true), Arc::new(MockOracle::default()));
    let mut state = state(3, 1);

    assert_eq!(engine.classify(&mut state, &passing()), Classification::Judge);
    assert!((state.current_yield() - 0.25).abs() < 1e-6);
}

#[test]
fn test_classify_past_sample_without_qualified_needs_target() {
    let engine = engine(policy(2, 0.0, false), Arc::new(MockOracle::default()));
    let mut state = state(2, 0);

    // processed becomes 3 > sample size and yield 0 >= target 0.
    assert_eq!(
        engine.classify(&mut state, &passing()),
        Classification::FastPath {
            newly_activated: true
        }
    );
}

#[tokio::test]
async fn test_decide_qualified_by_score_override() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Verdict(OracleVerdict::new(
        false, 7.0, 2.0,
    ))));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics = vec!["topic".to_string()];

    let decision = engine
        .decide(CycleState::new(), &doc("a"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::Qualified);
    assert_eq!(decision.state.processed(), 1);
    assert_eq!(decision.state.qualified(), 1);
    assert_eq!(decision.oracle_calls, 1);
    assert!(decision.signal.is_none());
}

#[tokio::test]
async fn test_decide_rejected_verdict() {
    let oracle = Arc::new(MockOracle::default());
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(CycleState::new(), &doc("a"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(
        decision.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::NotQualified
        }
    );
    assert_eq!(decision.state.qualified(), 0);
    assert!(decision.verdict.is_some());
}

#[tokio::test]
async fn test_decide_filtered_skips_oracle() {
    let oracle = Arc::new(MockOracle::default());
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(state(2, 1), &doc("a"), &failing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::FilteredOut);
    assert_eq!(decision.state, state(2, 1));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_decide_signals_fail_fast_without_oracle() {
    let oracle = Arc::new(MockOracle::default());
    let engine = engine(policy(3, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(state(2, 0), &doc("c"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::AbortedLowYield);
    assert_eq!(decision.signal, Some(EngineSignal::FailFastTriggered));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_zero_probability_triggers_single_corrective_query() {
    let oracle = Arc::new(MockOracle::default().script(
        "z",
        vec![
            MockResponse::Verdict(OracleVerdict::new(false, 0.0, 0.0).with_summary("Off topic.")),
            MockResponse::Verdict(OracleVerdict::new(false, 3.0, 6.0)),
        ],
    ));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(CycleState::new(), &doc("z"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::Qualified);
    assert_eq!(decision.oracle_calls, 2);
    let calls = oracle.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].corrective);
    assert!(calls[1].corrective);
}

#[tokio::test]
async fn test_corrective_query_never_repeats() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Verdict(OracleVerdict::new(
        false, 0.0, 0.0,
    ))));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(CycleState::new(), &doc("z"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(
        decision.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::NotQualified
        }
    );
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_failed_corrective_keeps_first_verdict() {
    let oracle = Arc::new(MockOracle::default().script(
        "z",
        vec![
            MockResponse::Verdict(OracleVerdict::new(true, 0.0, 0.0)),
            MockResponse::Error("backend down".to_string()),
        ],
    ));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(CycleState::new(), &doc("z"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::Qualified);
    assert_eq!(decision.verdict.map(|v| v.probability), Some(0.0));
}

#[tokio::test]
async fn test_oracle_failures_map_to_reject_reasons() {
    let oracle = Arc::new(
        MockOracle::default()
            .script("err", vec![MockResponse::Error("503".to_string())])
            .script("bad", vec![MockResponse::Malformed]),
    );
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let err = engine
        .decide(CycleState::new(), &doc("err"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");
    assert_eq!(
        err.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::OracleError
        }
    );
    assert_eq!(err.state.processed(), 1);
    assert!(err.detail.is_some());

    let bad = engine
        .decide(CycleState::new(), &doc("bad"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");
    assert_eq!(
        bad.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::Malformed
        }
    );
}

#[tokio::test]
async fn test_hanging_oracle_times_out() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Hang));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let decision = engine
        .decide(CycleState::new(), &doc("h"), &passing(), ctx(&topics, &cancel))
        .await
        .expect("not cancelled");

    assert_eq!(
        decision.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::Timeout
        }
    );
    assert_eq!(decision.state.processed(), 1);
}

#[tokio::test]
async fn test_cancelled_before_judgment_leaves_no_decision() {
    let oracle = Arc::new(MockOracle::default());
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let topics: Vec<String> = Vec::new();

    let result = engine
        .decide(CycleState::new(), &doc("a"), &passing(), ctx(&topics, &cancel))
        .await;

    assert_eq!(result.err(), Some(Cancelled));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_during_judgment() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Hang));
    let engine = DecisionEngine::new(
        policy(10, 0.5, true),
        Arc::<MockOracle>::clone(&oracle),
        Duration::from_secs(60),
    );
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = engine
        .decide(CycleState::new(), &doc("a"), &passing(), ctx(&topics, &cancel))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_operator_skip_rejects_item() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Hang));
    let engine = DecisionEngine::new(
        policy(10, 0.5, true),
        Arc::<MockOracle>::clone(&oracle),
        Duration::from_secs(60),
    );
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();
    let (control, mut inbox) = operator_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        control.skip();
    });

    let decision = engine
        .decide(
            CycleState::new(),
            &doc("s"),
            &passing(),
            JudgmentContext {
                topics: &topics,
                thresholds: QueryThresholds::default(),
                cancel: &cancel,
                overrides: Some(&mut inbox),
            },
        )
        .await
        .expect("not cancelled");

    assert_eq!(
        decision.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::Skipped
        }
    );
}

#[tokio::test]
async fn test_operator_retry_reissues_call() {
    let oracle = Arc::new(
        MockOracle::default().script("r", vec![MockResponse::Hang, MockResponse::qualified(8.0)]),
    );
    let engine = DecisionEngine::new(
        policy(10, 0.5, true),
        Arc::<MockOracle>::clone(&oracle),
        Duration::from_secs(60),
    );
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();
    let (control, mut inbox) = operator_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        control.send_for("r", OperatorAction::Retry);
    });

    let decision = engine
        .decide(
            CycleState::new(),
            &doc("r"),
            &passing(),
            JudgmentContext {
                topics: &topics,
                thresholds: QueryThresholds::default(),
                cancel: &cancel,
                overrides: Some(&mut inbox),
            },
        )
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::Qualified);
    assert_eq!(decision.oracle_calls, 2);
    assert_eq!(oracle.calls_for("r"), 2);
}

#[tokio::test]
async fn test_stale_operator_commands_are_discarded() {
    let oracle = Arc::new(MockOracle::new(MockResponse::qualified(9.0)));
    let engine = engine(policy(10, 0.5, true), Arc::clone(&oracle));
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();
    let (control, mut inbox) = operator_channel();
    control.skip();

    let decision = engine
        .decide(
            CycleState::new(),
            &doc("a"),
            &passing(),
            JudgmentContext {
                topics: &topics,
                thresholds: QueryThresholds::default(),
                cancel: &cancel,
                overrides: Some(&mut inbox),
            },
        )
        .await
        .expect("not cancelled");

    assert_eq!(decision.outcome, QualificationOutcome::Qualified);
}

#[tokio::test]
async fn test_command_for_later_document_is_kept_until_judged() {
    let (control, mut inbox) = operator_channel();
    control.skip();
    control.send_for("b", OperatorAction::Skip);

    assert_eq!(inbox.drain_stale(), 1);
    assert_eq!(inbox.parked(), 1);

    control.send_for("c", OperatorAction::Retry);
    control.send_for("a", OperatorAction::Retry);
    assert_eq!(inbox.next_for("a").await, OperatorAction::Retry);
    assert_eq!(inbox.parked(), 2);

    assert_eq!(inbox.next_for("b").await, OperatorAction::Skip);
    assert_eq!(inbox.next_for("c").await, OperatorAction::Retry);
    assert_eq!(inbox.parked(), 0);
}

#[tokio::test]
async fn test_skip_sent_ahead_applies_to_its_document() {
    let oracle = Arc::new(MockOracle::new(MockResponse::Hang));
    let engine = DecisionEngine::new(
        policy(10, 0.5, true),
        Arc::<MockOracle>::clone(&oracle),
        Duration::from_secs(60),
    );
    let cancel = CancellationToken::new();
    let topics: Vec<String> = Vec::new();
    let (control, mut inbox) = operator_channel();
    control.send_for("later", OperatorAction::Skip);

    let decision = engine
        .decide(
            CycleState::new(),
            &doc("later"),
            &passing(),
            JudgmentContext {
                topics: &topics,
                thresholds: QueryThresholds::default(),
                cancel: &cancel,
                overrides: Some(&mut inbox),
            },
        )
        .await
        .expect("not cancelled");

    assert_eq!(
        decision.outcome,
        QualificationOutcome::Rejected {
            reason: RejectReason::Skipped
        }
    );
}

#[test]
fn test_outcome_labels_and_serde() {
    let outcome = QualificationOutcome::Rejected {
        reason: RejectReason::Timeout,
    };
    assert_eq!(outcome.to_string(), "REJECTED (timeout)");
    assert!(outcome.is_terminal());
    assert!(!QualificationOutcome::PendingJudgment.is_terminal());
    assert!(QualificationOutcome::QualifiedFastPath.is_qualified());

    let json = serde_json::to_value(outcome).expect("serialize");
    assert_eq!(json["outcome"], "REJECTED");
    assert_eq!(json["reason"], "timeout");
}
