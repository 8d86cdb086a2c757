//! # Inbound Batching
//!
//! A burst of agent messages lands inside one batch boundary scope, so an
//! observer of the notifier sees every handler's effect at once.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use devtools_catalog::{DevtoolsEvent, DevtoolsTopic};
    use parking_lot::Mutex;
    use port_bridge::{port_pair, ChangeNotifier, PortMessageBus};
    use shared_bus::MessageBus;
    use shared_types::WireMessage;
    use tokio::time::timeout;

    use crate::integration::support::post;

    #[tokio::test]
    async fn test_burst_settles_in_one_revision() {
        let (panel, agent) = port_pair("batching");
        let notifier = Arc::new(ChangeNotifier::new());
        let adapter = PortMessageBus::<DevtoolsEvent>::connect(panel, Arc::clone(&notifier) as _);
        let mut revisions = notifier.subscribe();

        let frames = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&frames);
        let _frames_sub = adapter
            .subscribe(DevtoolsTopic::ProfilerFrame, move |_: &DevtoolsEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        // Posted before the pump gets a chance to run.
        for index in 0..10 {
            post(&agent, &DevtoolsEvent::ProfilerFrame(serde_json::json!(index)));
        }

        timeout(Duration::from_secs(1), revisions.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*revisions.borrow_and_update(), 1);
        assert_eq!(frames.load(Ordering::SeqCst), 10);

        let stats = adapter.stats();
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.received, 10);
    }

    #[tokio::test]
    async fn test_handlers_run_in_arrival_order_across_topics() {
        let (panel, agent) = port_pair("batching");
        let notifier = Arc::new(ChangeNotifier::new());
        let adapter = PortMessageBus::<DevtoolsEvent>::connect(panel, Arc::clone(&notifier) as _);
        let mut revisions = notifier.subscribe();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Vec::new();
        for topic in [DevtoolsTopic::TargetNavigated, DevtoolsTopic::UpdateRouterTree] {
            let seen = Arc::clone(&seen);
            subscriptions.push(
                adapter
                    .subscribe(topic, move |event: &DevtoolsEvent| {
                        seen.lock().push(shared_types::Events::name(event));
                    })
                    .unwrap(),
            );
        }

        // Background before critical: inbound dispatch is not reordered.
        post(&agent, &DevtoolsEvent::UpdateRouterTree(vec![]));
        post(&agent, &DevtoolsEvent::TargetNavigated("/next".into()));

        timeout(Duration::from_secs(1), revisions.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*seen.lock(), vec!["updateRouterTree", "targetNavigated"]);
    }

    #[tokio::test]
    async fn test_bad_messages_do_not_break_the_batch() {
        let (panel, agent) = port_pair("batching");
        let notifier = Arc::new(ChangeNotifier::new());
        let adapter = PortMessageBus::<DevtoolsEvent>::connect(panel, Arc::clone(&notifier) as _);
        let mut revisions = notifier.subscribe();

        let navigations = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&navigations);
        let _sub = adapter
            .subscribe(DevtoolsTopic::TargetNavigated, move |event: &DevtoolsEvent| {
                if let DevtoolsEvent::TargetNavigated(url) = event {
                    log.lock().push(url.clone());
                }
            })
            .unwrap();

        post(&agent, &DevtoolsEvent::TargetNavigated("/a".into()));
        agent
            .sink
            .post(WireMessage::new("noSuchTopic", vec![]))
            .unwrap();
        agent
            .sink
            .post(WireMessage::new("targetNavigated", vec![serde_json::json!(42)]))
            .unwrap();
        agent.sink.post(WireMessage::new("portClosed", vec![])).unwrap();
        post(&agent, &DevtoolsEvent::TargetNavigated("/b".into()));

        timeout(Duration::from_secs(1), revisions.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*navigations.lock(), vec!["/a", "/b"]);

        let stats = adapter.stats();
        assert_eq!(stats.received, 5);
        assert_eq!(stats.decode_failures, 3);
        assert!(adapter.state().is_connected());
    }
}
