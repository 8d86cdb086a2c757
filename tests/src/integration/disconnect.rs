//! # Disconnect Handling
//!
//! The agent's port going away is observed exactly once, locally, and
//! traffic emitted afterwards is dropped instead of failing the caller.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use devtools_catalog::{DevtoolsEvent, DevtoolsTopic};
    use port_bridge::{port_pair, ConnectionState, Immediate, PortMessageBus};
    use shared_bus::{DrainMode, MessageBus, PriorityAwareBus, SchedulerConfig};
    use tokio::time::timeout;

    fn count_closed(adapter: &PortMessageBus<DevtoolsEvent>) -> Arc<AtomicUsize> {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closed);
        adapter
            .subscribe(DevtoolsTopic::PortClosed, move |_: &DevtoolsEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
            .detach();
        closed
    }

    #[tokio::test]
    async fn test_agent_going_away_is_reported_once() {
        let (panel, agent) = port_pair("disconnect");
        let adapter = PortMessageBus::<DevtoolsEvent>::connect(panel, Arc::new(Immediate));
        let closed = count_closed(&adapter);

        drop(agent);
        timeout(Duration::from_secs(1), adapter.disconnected())
            .await
            .unwrap();

        assert_eq!(adapter.state(), ConnectionState::Disconnected);
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        // Later teardown does not report it again.
        adapter.destroy();
        adapter.destroy();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queued_traffic_after_disconnect_is_dropped() {
        let (panel, agent) = port_pair("disconnect");
        let adapter = Arc::new(PortMessageBus::<DevtoolsEvent>::connect(
            panel,
            Arc::new(Immediate),
        ));
        let bus = PriorityAwareBus::with_config(
            Arc::clone(&adapter),
            SchedulerConfig::default().with_drain_mode(DrainMode::Deferred),
        );

        bus.emit(DevtoolsEvent::StartProfiling()).unwrap();
        bus.emit(DevtoolsEvent::RemoveHighlightOverlay()).unwrap();

        drop(agent);
        timeout(Duration::from_secs(1), adapter.disconnected())
            .await
            .unwrap();

        let outcome = bus.drain();
        assert_eq!(outcome.forwarded, 2);
        assert_eq!(bus.stats().forward_failures, 0);

        let stats = adapter.stats();
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.dropped, 2);
    }

    #[tokio::test]
    async fn test_destroy_closes_the_agent_side() {
        let (panel, mut agent) = port_pair("disconnect");
        let adapter = PortMessageBus::<DevtoolsEvent>::connect(panel, Arc::new(Immediate));
        let mut state = adapter.watch_state();

        adapter.destroy();

        let eof = timeout(Duration::from_secs(1), agent.inbound.recv())
            .await
            .unwrap();
        assert!(eof.is_none());
        assert_eq!(*state.borrow_and_update(), ConnectionState::Disconnected);
        assert_eq!(
            adapter.emit(DevtoolsEvent::Handshake()),
            Err(shared_bus::BusError::Closed)
        );
    }
}
