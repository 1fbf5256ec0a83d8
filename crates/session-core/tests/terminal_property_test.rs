//! Any emission sequence ending in a terminal status shuts down exactly once

mod common;

use std::sync::Arc;

use callkeeper_call_core::{CallStatus, SimulatedProvider};
use callkeeper_session_core::SessionOrchestrator;
use common::{eventually, RecordingSink};
use proptest::prelude::*;

fn live_status() -> impl Strategy<Value = CallStatus> {
    prop_oneof![
        Just(CallStatus::Idle),
        Just(CallStatus::Initiating),
        Just(CallStatus::Ringing),
        Just(CallStatus::Connecting),
        Just(CallStatus::Connected),
        Just(CallStatus::Reconnecting),
    ]
}

fn terminal_status() -> impl Strategy<Value = CallStatus> {
    prop_oneof![Just(CallStatus::Disconnecting), Just(CallStatus::Disconnected)]
}

fn run(live: Vec<CallStatus>, terminal: Vec<CallStatus>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async move {
        let sink = RecordingSink::new();
        let orchestrator = SessionOrchestrator::with_defaults(sink.clone());
        let provider = Arc::new(SimulatedProvider::new("Ada", "+15550100"));
        orchestrator.start(Some(provider.clone())).await.unwrap();

        for status in live.iter().chain(terminal.iter()) {
            provider.set_status(*status).unwrap();
        }
        eventually("session shut down", || sink.release_count() == 1).await;

        // Terminal statuses published after shutdown change nothing.
        provider.set_status(CallStatus::Disconnected).unwrap();
        assert!(!orchestrator.shutdown().await);
        common::settle().await;

        let stats = orchestrator.stats();
        assert_eq!(stats.shutdowns, 1);
        assert_eq!(sink.release_count(), 1);
        assert_eq!(stats.timer_starts, stats.timer_stops);
        assert!(!orchestrator.is_timer_running());
        assert!(!orchestrator.is_active());
        assert_eq!(provider.subscriber_count(), 0);
        // Initial replay, every live emission, then exactly one terminal reaction.
        assert_eq!(stats.reactions as usize, live.len() + 2);
        assert!(!sink
            .statuses()
            .iter()
            .any(|status| status.is_terminal()));
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_terminal_sequence_shuts_down_exactly_once(
        live in prop::collection::vec(live_status(), 0..16),
        terminal in prop::collection::vec(terminal_status(), 1..4),
    ) {
        run(live, terminal);
    }
}
