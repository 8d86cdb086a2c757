//! # Scheduler In Front Of A Port
//!
//! The priority-aware bus decorating a real port adapter: what the agent
//! receives is the scheduler's forwarding order, not the emission order.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use devtools_catalog::{coalesced_topics, DevtoolsEvent};
    use port_bridge::{port_pair, Immediate, PortMessageBus};
    use shared_bus::{DrainBudget, DrainMode, MessageBus, PriorityAwareBus, SchedulerConfig};
    use shared_types::Events;

    use crate::integration::support::next_event;

    fn deferred_link(
        config: SchedulerConfig<devtools_catalog::DevtoolsTopic>,
    ) -> (
        PriorityAwareBus<DevtoolsEvent, Arc<PortMessageBus<DevtoolsEvent>>>,
        port_bridge::Port,
    ) {
        let (panel, agent) = port_pair("priority-link");
        let adapter = Arc::new(PortMessageBus::connect(panel, Arc::new(Immediate)));
        let bus = PriorityAwareBus::with_config(adapter, config.with_drain_mode(DrainMode::Deferred));
        (bus, agent)
    }

    #[tokio::test]
    async fn test_agent_receives_lifecycle_before_requests_and_overlays() {
        let (bus, mut agent) = deferred_link(SchedulerConfig::default().coalescing(coalesced_topics()));

        for index in 0..4 {
            bus.emit(DevtoolsEvent::ProfilerFrame(serde_json::json!({ "frame": index })))
                .unwrap();
        }
        bus.emit(DevtoolsEvent::GetLatestComponentExplorerView(None)).unwrap();
        bus.emit(DevtoolsEvent::HighlightComponent(vec![0, 1])).unwrap();
        bus.emit(DevtoolsEvent::GetLatestComponentExplorerView(None)).unwrap();
        bus.emit(DevtoolsEvent::TargetNavigated("/home".to_string())).unwrap();
        bus.emit(DevtoolsEvent::Handshake()).unwrap();

        let outcome = bus.drain();
        assert_eq!(outcome.forwarded, 8);
        assert_eq!(outcome.remaining, 0);

        let mut names = Vec::new();
        for _ in 0..8 {
            names.push(next_event(&mut agent).await.unwrap().name());
        }
        assert_eq!(
            names,
            vec![
                "targetNavigated",
                "handshake",
                "getLatestComponentExplorerView",
                "sendProfilerChunk",
                "sendProfilerChunk",
                "sendProfilerChunk",
                "sendProfilerChunk",
                "highlightComponent",
            ]
        );

        let stats = bus.stats();
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.promotions, 0);
        assert_eq!(bus.inner().stats().sent, 8);
    }

    #[tokio::test]
    async fn test_background_frame_promoted_under_critical_flood() {
        let (bus, mut agent) = deferred_link(SchedulerConfig::default());

        for index in 0..6 {
            bus.emit(DevtoolsEvent::TargetNavigated(format!("/page/{index}")))
                .unwrap();
        }
        bus.emit(DevtoolsEvent::ProfilerFrame(serde_json::json!({}))).unwrap();
        bus.drain();

        let mut received = Vec::new();
        for _ in 0..7 {
            received.push(next_event(&mut agent).await.unwrap());
        }
        let frame_at = received
            .iter()
            .position(|event| matches!(event, DevtoolsEvent::ProfilerFrame(_)))
            .unwrap();
        assert_eq!(frame_at, 3);

        // Critical order survives the promotion.
        let urls: Vec<_> = received
            .iter()
            .filter_map(|event| match event {
                DevtoolsEvent::TargetNavigated(url) => Some(url.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            urls,
            (0..6).map(|index| format!("/page/{index}")).collect::<Vec<_>>()
        );
        assert_eq!(bus.stats().promotions, 1);
    }

    #[tokio::test]
    async fn test_budget_splits_drain_across_turns() {
        let (bus, mut agent) =
            deferred_link(SchedulerConfig::default().with_budget(DrainBudget::messages(2)));

        for index in 0..5u32 {
            bus.emit(DevtoolsEvent::HighlightComponent(vec![index])).unwrap();
        }

        let first = bus.drain();
        assert_eq!(first.forwarded, 2);
        assert!(first.budget_exhausted);
        assert_eq!(bus.pending(), 3);

        bus.drain();
        bus.drain();
        assert_eq!(bus.pending(), 0);

        for index in 0..5u32 {
            assert_eq!(
                next_event(&mut agent).await.unwrap(),
                DevtoolsEvent::HighlightComponent(vec![index])
            );
        }
    }

    #[tokio::test]
    async fn test_run_loop_forwards_without_explicit_drain() {
        let (bus, mut agent) = deferred_link(SchedulerConfig::default());
        let bus = Arc::new(bus);
        let driver = tokio::spawn({
            let bus = Arc::clone(&bus);
            async move { bus.run().await }
        });

        bus.emit(DevtoolsEvent::GetRoutes()).unwrap();
        bus.emit(DevtoolsEvent::Shutdown()).unwrap();

        assert_eq!(next_event(&mut agent).await.unwrap(), DevtoolsEvent::Shutdown());
        assert_eq!(next_event(&mut agent).await.unwrap(), DevtoolsEvent::GetRoutes());

        bus.destroy();
        tokio::time::timeout(std::time::Duration::from_secs(1), driver)
            .await
            .unwrap()
            .unwrap();
    }
}
