//! Audit coordinator tests
//!
//! Exercise the single-flight state machine with scripted backends

mod common;

use common::{GatedSynth, RecordingSynth, TIMEOUT};
use kairos::audit::{AuditEvent, Coordinator, CoordinatorState, RunId};
use kairos::speech::Engine;
use kairos::{KairosError, SpeakError};
use std::sync::atomic::Ordering;
use std::sync::mpsc;

#[test]
fn test_blank_input_is_rejected() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    assert!(matches!(coordinator.submit("", 200), Err(KairosError::EmptyInput)));
    assert!(matches!(coordinator.submit("   ", 200), Err(KairosError::EmptyInput)));

    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(rx.try_recv().is_err());
    assert_eq!(probe.calls(), ["volume 1"]);
}

#[test]
fn test_out_of_range_rate_never_reaches_engine() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    for wpm in [0, 99, 401, 1000] {
        assert!(matches!(
            coordinator.submit("Access granted.", wpm),
            Err(KairosError::RateOutOfRange { .. })
        ));
    }

    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(rx.try_recv().is_err());
    assert!(!probe.calls().iter().any(|c| c.starts_with("rate")));
}

#[test]
fn test_successful_run() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    let run = coordinator.submit("Access granted.", 250).unwrap();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), AuditEvent::RunStarted { run });
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        AuditEvent::RunFinished { run, error: None }
    );

    coordinator.wait_idle();
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert_eq!(probe.calls(), ["volume 1", "rate 250", "speak Access granted."]);
}

#[test]
fn test_text_is_sanitized_before_speaking() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, _rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    coordinator.submit("Log@123: failed! <break/>", 200).unwrap();
    coordinator.wait_idle();

    assert_eq!(probe.calls().last().unwrap(), "speak Log123 failed! break");
}

#[test]
fn test_fully_stripped_text_still_completes() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    let run = coordinator.submit("### $$$ @@@", 200).unwrap();
    coordinator.wait_idle();

    assert_eq!(rx.recv().unwrap(), AuditEvent::RunStarted { run });
    assert_eq!(rx.recv().unwrap(), AuditEvent::RunFinished { run, error: None });
    assert!(!probe.calls().iter().any(|c| c.starts_with("speak")));
}

#[test]
fn test_busy_while_running() {
    let (synth, probe, release) = GatedSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    let run = coordinator.submit("first", 200).unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Running);
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), AuditEvent::RunStarted { run });

    assert!(matches!(coordinator.submit("second", 200), Err(KairosError::Busy)));
    assert!(matches!(coordinator.submit("third", 300), Err(KairosError::Busy)));
    assert_eq!(coordinator.state(), CoordinatorState::Running);

    release.send(()).unwrap();
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        AuditEvent::RunFinished { run, error: None }
    );
    assert_eq!(coordinator.state(), CoordinatorState::Idle);

    coordinator.wait_idle();
    assert_eq!(probe.calls(), ["rate 200", "speak first"]);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_runs_never_overlap() {
    let (synth, probe, release) = GatedSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    let mut finished = Vec::new();
    for i in 0..5 {
        let run = coordinator.submit(&format!("entry {}", i), 200).unwrap();
        assert!(matches!(coordinator.submit("overlap", 200), Err(KairosError::Busy)));

        release.send(()).unwrap();
        loop {
            match rx.recv_timeout(TIMEOUT).unwrap() {
                AuditEvent::RunFinished { run: done, error } => {
                    assert_eq!(done, run);
                    assert_eq!(error, None);
                    finished.push(done);
                    break;
                }
                AuditEvent::RunStarted { .. } => {}
            }
        }
    }

    coordinator.wait_idle();
    assert_eq!(finished, (1..=5).map(RunId).collect::<Vec<_>>());
    assert_eq!(probe.max_active.load(Ordering::SeqCst), 1);
}

#[test]
fn test_backend_failure_returns_to_idle() {
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(Engine::from_synth(Box::new(synth)).unwrap(), tx);

    let failed = coordinator.submit("FAIL now", 200).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), AuditEvent::RunStarted { run: failed });
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        AuditEvent::RunFinished {
            run: failed,
            error: Some(SpeakError::Backend("audio sink disappeared".to_string())),
        }
    );

    // Operator retries after the failure
    let retry = coordinator.submit("Retry succeeded.", 300).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), AuditEvent::RunStarted { run: retry });
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        AuditEvent::RunFinished { run: retry, error: None }
    );

    coordinator.wait_idle();
    assert_eq!(probe.calls().last().unwrap(), "speak Retry succeeded.");
}

#[test]
fn test_submit_from_finish_notification() {
    // A dispatcher that forwards to a channel, like the shell does
    let (synth, probe) = RecordingSynth::new();
    let (tx, rx) = mpsc::channel::<AuditEvent>();
    let mut coordinator = Coordinator::new(
        Engine::from_synth(Box::new(synth)).unwrap(),
        move |event: AuditEvent| {
            let _ = tx.send(event);
        },
    );

    let first = coordinator.submit("one", 200).unwrap();
    loop {
        if let AuditEvent::RunFinished { run, .. } = rx.recv_timeout(TIMEOUT).unwrap() {
            assert_eq!(run, first);
            break;
        }
    }

    // Idle is guaranteed once RunFinished has been delivered
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    let second = coordinator.submit("two", 200).unwrap();
    coordinator.wait_idle();

    assert_eq!(rx.recv().unwrap(), AuditEvent::RunStarted { run: second });
    assert_eq!(rx.recv().unwrap(), AuditEvent::RunFinished { run: second, error: None });
    assert_eq!(probe.calls().len(), 5);
}
