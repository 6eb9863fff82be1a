//! Assertion helpers over the emitted event stream.
#![allow(dead_code)]

use sp_protocol::ipc::Event;

/// Number of `RunCompleted` and `RunFailed` events.
pub fn terminal_run_events(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::RunCompleted { .. } | Event::RunFailed { .. }))
        .count()
}

/// Progress values in the order they were reported.
pub fn progress_values(events: &[Event]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::RunProgress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect()
}

pub fn assert_non_decreasing(values: &[u8]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "progress regressed from {} to {} in {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}

/// The error of the single `RunFailed` event, if any.
pub fn run_failure(events: &[Event]) -> Option<String> {
    events.iter().find_map(|e| match e {
        Event::RunFailed { error, .. } => Some(error.clone()),
        _ => None,
    })
}

pub fn count_matching(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}

/// Assert the stream opens with `RunStarted` and ends with exactly one
/// terminal event.
pub fn assert_run_event_sequence(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::RunStarted { .. })),
        "first event should be RunStarted, got: {:?}",
        events.first()
    );
    assert!(
        matches!(
            events.last(),
            Some(Event::RunCompleted { .. } | Event::RunFailed { .. })
        ),
        "last event should be terminal, got: {:?}",
        events.last()
    );
    assert_eq!(terminal_run_events(events), 1, "terminal event sent more than once");
}
