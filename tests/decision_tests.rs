// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the flow-control decisions

use frameflow::flow::{
    CorrectionAction, CorrectionCompletion, InflightAction, WriteFailureAction,
    decide_sab_write_failure, decide_stride_correction_completion,
    decide_stride_correction_dispatch, decide_worker_inflight_dispatch,
    update_worker_inflight_peaks,
};

#[test]
fn test_admission_scenarios() {
    let decision = decide_worker_inflight_dispatch(1, 2, false);
    assert_eq!(decision.action, InflightAction::Dispatch);
    assert_eq!(decision.next_frames_in_flight, 2);
    assert_eq!(decision.backpressure_hits_increment, 0);
    assert_eq!(decision.superseded_drops_increment, 0);

    let decision = decide_worker_inflight_dispatch(2, 2, false);
    assert_eq!(decision.action, InflightAction::Backpressure);
    assert_eq!(decision.next_frames_in_flight, 2);
    assert_eq!(decision.backpressure_hits_increment, 1);
    assert_eq!(decision.superseded_drops_increment, 0);

    let decision = decide_worker_inflight_dispatch(4, 2, true);
    assert_eq!(decision.action, InflightAction::Backpressure);
    assert_eq!(decision.next_frames_in_flight, 4);
    assert_eq!(decision.backpressure_hits_increment, 1);
    assert_eq!(decision.superseded_drops_increment, 1);
}

#[test]
fn test_backpressure_never_lowers_in_flight() {
    for limit in 1..5 {
        for in_flight in limit..limit + 5 {
            let decision = decide_worker_inflight_dispatch(in_flight, limit, false);
            assert!(
                decision.next_frames_in_flight >= in_flight,
                "backpressure lowered in-flight count"
            );
            assert_eq!(
                decision.backpressure_hits_increment == 1,
                decision.action == InflightAction::Backpressure
            );
        }
    }
}

#[test]
fn test_peaks_monotonic_over_sequence() {
    let samples = [0, 3, 1, 2, 5, 4, 0, 5];
    let (mut window, mut total) = (0, 0);
    for sample in samples {
        let peaks = update_worker_inflight_peaks(sample, window, total);
        assert!(peaks.peak_window >= window);
        assert!(peaks.peak_total >= total);
        window = peaks.peak_window;
        total = peaks.peak_total;
    }
    assert_eq!(total, 5);

    // Repeating a non-increasing sample changes nothing
    let first = update_worker_inflight_peaks(2, window, total);
    let second = update_worker_inflight_peaks(2, first.peak_window, first.peak_total);
    assert_eq!(first, second);
}

#[test]
fn test_write_failure_scenarios() {
    let decision = decide_sab_write_failure(false, 1, 2);
    assert_eq!(decision.action, WriteFailureAction::Retry);
    assert_eq!(decision.next_retry_count, 2);

    let decision = decide_sab_write_failure(false, 2, 2);
    assert_eq!(decision.action, WriteFailureAction::FallbackRetryLimit);
    assert_eq!(decision.next_retry_count, 0);

    let decision = decide_sab_write_failure(true, 0, 5);
    assert_eq!(decision.action, WriteFailureAction::FallbackOversize);
    assert_eq!(decision.next_retry_count, 0);
}

#[test]
fn test_write_failure_retry_boundary() {
    for retry_limit in 0..4 {
        for retry_count in 0..6 {
            let decision = decide_sab_write_failure(false, retry_count, retry_limit);
            if retry_count < retry_limit {
                assert_eq!(decision.action, WriteFailureAction::Retry);
                assert_eq!(decision.next_retry_count, retry_count + 1);
            } else {
                assert_eq!(decision.action, WriteFailureAction::FallbackRetryLimit);
                assert_eq!(decision.next_retry_count, 0);
            }
        }
    }
}

#[test]
fn test_correction_scenarios() {
    let decision = decide_stride_correction_dispatch(false, false);
    assert_eq!(
        (
            decision.action,
            decision.next_in_flight,
            decision.next_has_pending,
            decision.superseded_drops_increment,
            decision.dispatches_increment
        ),
        (CorrectionAction::Dispatch, true, false, 0, 1)
    );

    let decision = decide_stride_correction_dispatch(true, false);
    assert_eq!(
        (
            decision.action,
            decision.next_in_flight,
            decision.next_has_pending,
            decision.superseded_drops_increment,
            decision.dispatches_increment
        ),
        (CorrectionAction::Queue, true, true, 0, 0)
    );

    let decision = decide_stride_correction_dispatch(true, true);
    assert_eq!(
        (
            decision.action,
            decision.next_in_flight,
            decision.next_has_pending,
            decision.superseded_drops_increment,
            decision.dispatches_increment
        ),
        (CorrectionAction::Queue, true, true, 1, 0)
    );
}

#[test]
fn test_correction_completion() {
    assert_eq!(
        decide_stride_correction_completion(true),
        CorrectionCompletion::Redispatch
    );
    assert_eq!(
        decide_stride_correction_completion(false),
        CorrectionCompletion::Idle
    );
}

#[test]
fn test_action_labels() {
    assert_eq!(InflightAction::Backpressure.as_str(), "backpressure");
    assert_eq!(WriteFailureAction::FallbackOversize.as_str(), "fallback_oversize");
    assert_eq!(
        serde_json::to_string(&WriteFailureAction::FallbackRetryLimit).unwrap(),
        "\"fallback_retry_limit\""
    );
    assert_eq!(CorrectionAction::Queue.as_str(), "queue");
}
