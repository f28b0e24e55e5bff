//! Retry loop behaviour against a scripted ledger
//!
//! Timing tests run on paused tokio time, so the rate-limit pause is
//! observed exactly without slowing the suite down.

mod common;

use common::*;
use pisweep::submit::{AMOUNT_TOO_SMALL, NO_ATTEMPTS};
use pisweep::{submit_payment, AttemptOutcome, FailureKind, KeyPair, LedgerError, Progress, SendConfig, SendRequest};
use std::time::Duration;

fn keypair() -> KeyPair {
    KeyPair::from_seed(&[9u8; 32])
}

fn request(requested: &str, balance: &str, sweep: bool) -> SendRequest {
    SendRequest { destination: destination(), requested: amount(requested), sweep, balance: amount(balance) }
}

/// Paused time advances to timer deadlines, which are rounded to the millisecond
fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "elapsed {:?}, expected {:?}",
        elapsed,
        expected
    );
}

async fn run(ledger: &FakeLedger, request: &SendRequest, config: &SendConfig) -> AttemptOutcome {
    submit_payment(ledger, keypair(), request, config, |_| {}).await
}

#[tokio::test(start_paused = true)]
async fn success_on_first_attempt() {
    let ledger = FakeLedger::new().then(accepted("abc123"));
    let outcome = run(&ledger, &request("0", "10.5", true), &SendConfig::default()).await;

    assert_eq!(outcome, AttemptOutcome::Success { hash: "abc123".into(), amount: amount("10.49"), attempts: 1 });
    assert_eq!(ledger.submit_count(), 1);
    assert_eq!(ledger.submitted()[0].amount, amount("10.49"));
}

#[tokio::test(start_paused = true)]
async fn requested_amount_capped_by_balance() {
    let ledger = FakeLedger::new().then(accepted("h"));
    let outcome = run(&ledger, &request("10", "5", false), &SendConfig::default()).await;

    match outcome {
        AttemptOutcome::Success { amount: sent, .. } => assert_eq!(sent, amount("4.99")),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn three_rate_limits_then_success() {
    let ledger = FakeLedger::new().then_n(3, rate_limited()).then(accepted("H"));
    let started = tokio::time::Instant::now();
    let outcome = run(&ledger, &request("1", "10", false), &SendConfig::default()).await;

    assert_eq!(outcome, AttemptOutcome::Success { hash: "H".into(), amount: amount("1"), attempts: 4 });
    assert_elapsed(started, Duration::from_millis(300));

    let at: Vec<_> = ledger.submitted().iter().map(|s| s.at).collect();
    for pair in at.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(100) && gap < Duration::from_millis(105), "gap {:?}", gap);
    }
}

#[tokio::test(start_paused = true)]
async fn non_rate_limit_errors_do_not_pause() {
    let ledger = FakeLedger::new()
        .then(transport("connection reset"))
        .then(Err(LedgerError::Http { status: 504, body: "timeout".into() }))
        .then(rejected("Transaction failed: tx_bad_seq"))
        .then(accepted("H"));
    let started = tokio::time::Instant::now();
    let outcome = run(&ledger, &request("1", "10", false), &SendConfig::default()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts(), 4);
    assert_elapsed(started, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn http_429_status_counts_as_rate_limit() {
    let ledger = FakeLedger::new()
        .then(Err(LedgerError::Http { status: 429, body: String::new() }))
        .then(accepted("H"));
    let started = tokio::time::Instant::now();
    let outcome = run(&ledger, &request("1", "10", false), &SendConfig::default()).await;

    assert_eq!(outcome.attempts(), 2);
    assert_elapsed(started, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_reports_last_error() {
    let ledger = FakeLedger::new()
        .then_n(4, rejected("Transaction failed: tx_bad_seq"))
        .then(transport("connection reset by peer"));
    let config = SendConfig::default().with_max_attempts(5);
    let outcome = run(&ledger, &request("1", "10", false), &config).await;

    assert_eq!(
        outcome,
        AttemptOutcome::Failure {
            kind: FailureKind::Submission,
            reason: "Transport error: connection reset by peer".into(),
            attempts: 5,
        }
    );
    assert_eq!(ledger.submit_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn rejection_reason_surfaces() {
    let ledger = FakeLedger::new().otherwise(rejected("Transaction failed: op_underfunded"));
    let config = SendConfig::default().with_max_attempts(3);
    let outcome = run(&ledger, &request("1", "10", false), &config).await;

    match outcome {
        AttemptOutcome::Failure { kind, reason, attempts } => {
            assert_eq!(kind, FailureKind::Submission);
            assert_eq!(reason, "Transaction failed: op_underfunded");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn no_pause_after_final_rate_limit() {
    let ledger = FakeLedger::new().otherwise(rate_limited());
    let config = SendConfig::default().with_max_attempts(3);
    let started = tokio::time::Instant::now();
    let outcome = run(&ledger, &request("1", "10", false), &config).await;

    assert_eq!(outcome.attempts(), 3);
    assert!(outcome.failure_kind() == Some(FailureKind::Submission));
    assert_elapsed(started, Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn account_load_failure_makes_no_attempts() {
    let ledger = FakeLedger::new().with_load_error(LedgerError::AccountNotFound("GABC".into()));
    let mut events = 0;
    let outcome =
        submit_payment(&ledger, keypair(), &request("1", "10", false), &SendConfig::default(), |_| events += 1).await;

    assert_eq!(
        outcome,
        AttemptOutcome::Failure {
            kind: FailureKind::AccountLoad,
            reason: "Failed to load account: Account not found: GABC".into(),
            attempts: 0,
        }
    );
    assert_eq!(events, 0);
    assert_eq!(ledger.submit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn fee_fetch_failure_makes_no_attempts() {
    let ledger = FakeLedger::new().with_fee_error(LedgerError::Transport("dns".into()));
    let outcome = run(&ledger, &request("1", "10", false), &SendConfig::default()).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::AccountLoad));
    assert_eq!(outcome.attempts(), 0);
    assert_eq!(ledger.submit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_amount_consumes_full_budget() {
    let ledger = FakeLedger::new().then(accepted("never"));
    let outcome = run(&ledger, &request("0", "0", false), &SendConfig::default()).await;

    assert_eq!(
        outcome,
        AttemptOutcome::Failure {
            kind: FailureKind::InsufficientAmount,
            reason: AMOUNT_TOO_SMALL.into(),
            attempts: 50,
        }
    );
    assert_eq!(ledger.submit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn balance_at_reserve_sends_nothing() {
    let ledger = FakeLedger::new();
    let config = SendConfig::default().with_max_attempts(2);
    let outcome = run(&ledger, &request("0", "0.01", true), &config).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::InsufficientAmount));
    assert_eq!(outcome.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_max_attempts() {
    let ledger = FakeLedger::new();
    let config = SendConfig::default().with_max_attempts(0);
    let outcome = run(&ledger, &request("1", "10", false), &config).await;

    assert_eq!(outcome, AttemptOutcome::Failure { kind: FailureKind::Submission, reason: NO_ATTEMPTS.into(), attempts: 0 });
    assert_eq!(ledger.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn progress_reported_per_attempt() {
    let ledger = FakeLedger::new().then_n(2, transport("reset")).then(accepted("H"));
    let mut events: Vec<Progress> = Vec::new();
    let outcome =
        submit_payment(&ledger, keypair(), &request("1", "10", false), &SendConfig::default(), |p| events.push(p)).await;

    assert!(outcome.is_success());
    assert_eq!(
        events,
        vec![
            Progress { attempt: 1, max_attempts: 50 },
            Progress { attempt: 2, max_attempts: 50 },
            Progress { attempt: 3, max_attempts: 50 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn every_attempt_reuses_the_same_sequence() {
    let ledger = FakeLedger::new().otherwise(rejected("Transaction failed: tx_bad_seq"));
    let config = SendConfig::default().with_max_attempts(6);
    run(&ledger, &request("1", "10", false), &config).await;

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 6);
    assert!(submitted.iter().all(|s| s.sequence == ledger.sequence + 1));
    assert!(submitted.iter().all(|s| s.fee == ledger.base_fee));
    assert_eq!(ledger.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_destination_fails_each_attempt_without_submitting() {
    let ledger = FakeLedger::new();
    let config = SendConfig::default().with_max_attempts(2);
    let mut bad = request("1", "10", false);
    bad.destination = "GNOTANADDRESS".into();
    let outcome = run(&ledger, &bad, &config).await;

    assert_eq!(outcome.attempts(), 2);
    assert_eq!(ledger.submit_count(), 0);
    match outcome {
        AttemptOutcome::Failure { reason, .. } => assert!(reason.starts_with("Invalid destination address")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn attempts_never_exceed_budget() {
    for max in [1u32, 2, 7, 50] {
        let ledger = FakeLedger::new().otherwise(rate_limited());
        let config = SendConfig::default().with_max_attempts(max);
        let outcome = run(&ledger, &request("1", "10", false), &config).await;
        assert_eq!(outcome.attempts(), max);
        assert_eq!(ledger.submit_count(), max as usize);
    }
}
