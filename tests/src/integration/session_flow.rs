//! # Panel Sessions Against A Scripted Agent
//!
//! Drives an [`InspectorSession`](panel_runtime::InspectorSession) through
//! the greeting, tree request and teardown paths, first over an in-memory
//! port and then through the supervisor over TCP.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use devtools_catalog::{ComponentExplorerView, ComponentNode, DevtoolsEvent, DevtoolsTopic};
    use panel_runtime::{InspectorSession, PanelConfig, Supervisor};
    use port_bridge::{port_from_tcp, port_pair, ConnectionState};
    use shared_bus::DrainMode;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::watch;
    use tokio::time::timeout;

    use crate::integration::support::{next_event, post};

    fn node(name: &str, children: Vec<ComponentNode>) -> ComponentNode {
        ComponentNode {
            name: name.to_string(),
            directives: vec![],
            children,
        }
    }

    async fn settle(changes: &mut watch::Receiver<u64>) {
        timeout(Duration::from_secs(2), changes.changed())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_greets_and_follows_the_target() {
        let (panel, mut agent) = port_pair("session-flow");
        let session = InspectorSession::open(panel, &PanelConfig::default()).unwrap();
        let mut changes = session.watch_changes();

        assert_eq!(next_event(&mut agent).await, Some(DevtoolsEvent::Handshake()));
        assert_eq!(
            next_event(&mut agent).await,
            Some(DevtoolsEvent::QueryTargetAvailability())
        );

        // Availability triggers a tree request from the panel.
        post(
            &agent,
            &DevtoolsEvent::TargetAvailability(true, Some("17.2.0".into())),
        );
        settle(&mut changes).await;
        assert_eq!(
            next_event(&mut agent).await,
            Some(DevtoolsEvent::GetLatestComponentExplorerView(None))
        );
        let status = session.status();
        assert_eq!(status.available, Some(true));
        assert_eq!(status.framework_version.as_deref(), Some("17.2.0"));

        let view = ComponentExplorerView {
            forest: vec![node("app-root", vec![node("app-nav", vec![]), node("app-list", vec![])])],
            properties: None,
        };
        post(&agent, &DevtoolsEvent::LatestComponentExplorerView(view));
        settle(&mut changes).await;
        assert_eq!(session.status().component_count, Some(3));

        post(&agent, &DevtoolsEvent::TargetNavigated("/settings".into()));
        settle(&mut changes).await;
        let status = session.status();
        assert!(status.connected);
        assert_eq!(status.url.as_deref(), Some("/settings"));
        assert_eq!(status.available, None);
        assert_eq!(status.component_count, None);

        drop(agent);
        timeout(Duration::from_secs(2), session.wait_disconnected())
            .await
            .unwrap();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(!session.status().connected);
    }

    #[tokio::test]
    async fn test_dirty_tree_triggers_a_refresh() {
        let (panel, mut agent) = port_pair("session-flow");
        let session = InspectorSession::open(panel, &PanelConfig::default()).unwrap();
        next_event(&mut agent).await;
        next_event(&mut agent).await;

        post(&agent, &DevtoolsEvent::ComponentTreeDirty());
        assert_eq!(
            next_event(&mut agent).await,
            Some(DevtoolsEvent::GetLatestComponentExplorerView(None))
        );

        session
            .request_component_tree(Some(devtools_catalog::ViewQuery {
                selected_element: Some(vec![0]),
                expanded_paths: vec![],
            }))
            .unwrap();
        let Some(DevtoolsEvent::GetLatestComponentExplorerView(Some(query))) =
            next_event(&mut agent).await
        else {
            panic!("expected a tree request with a query");
        };
        assert_eq!(query.selected_element, Some(vec![0]));
    }

    #[tokio::test]
    async fn test_profiler_frames_stream_until_close() {
        let (panel, agent) = port_pair("session-flow");
        let session = InspectorSession::open(panel, &PanelConfig::default()).unwrap();
        let mut frames = session.events(DevtoolsTopic::ProfilerFrame).unwrap();

        for index in 0..3 {
            post(&agent, &DevtoolsEvent::ProfilerFrame(serde_json::json!({ "frame": index })));
        }

        for index in 0..3 {
            let frame = timeout(Duration::from_secs(2), frames.next_event())
                .await
                .unwrap();
            assert_eq!(
                frame,
                Some(DevtoolsEvent::ProfilerFrame(serde_json::json!({ "frame": index })))
            );
        }
        assert_eq!(session.status().profiler_frames, 3);

        session.close();
        let end = timeout(Duration::from_secs(2), frames.next_event())
            .await
            .unwrap();
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_close_says_goodbye_and_hangs_up() {
        let (panel, mut agent) = port_pair("session-flow");
        let session = InspectorSession::open(panel, &PanelConfig::default()).unwrap();

        session.close();

        let mut names = Vec::new();
        while let Some(event) = next_event(&mut agent).await {
            names.push(event);
        }
        assert_eq!(
            names,
            vec![
                DevtoolsEvent::Handshake(),
                DevtoolsEvent::QueryTargetAvailability(),
                DevtoolsEvent::Shutdown(),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deferred_close_still_says_goodbye() {
        let mut config = PanelConfig::default();
        config.scheduler.drain_mode = DrainMode::Deferred;
        config.scheduler.drain_max_messages = Some(1);

        for round in 0..20 {
            let (panel, mut agent) = port_pair("session-flow");
            let session = InspectorSession::open(panel, &config).unwrap();
            for _ in 0..8 {
                session.request_component_tree(None).unwrap();
            }
            session.close();

            let mut received = Vec::new();
            while let Some(event) = next_event(&mut agent).await {
                received.push(event);
            }
            assert!(received.contains(&DevtoolsEvent::Shutdown()), "round {round}");
        }
    }

    #[tokio::test]
    async fn test_inline_budget_does_not_strand_requests() {
        let mut config = PanelConfig::default();
        config.scheduler.drain_max_messages = Some(1);
        let (panel, mut agent) = port_pair("session-flow");
        let session = InspectorSession::open(panel, &config).unwrap();

        session.request_component_tree(None).unwrap();
        assert_eq!(session.bus().pending(), 0);

        assert_eq!(next_event(&mut agent).await, Some(DevtoolsEvent::Handshake()));
        assert_eq!(
            next_event(&mut agent).await,
            Some(DevtoolsEvent::QueryTargetAvailability())
        );
        assert_eq!(
            next_event(&mut agent).await,
            Some(DevtoolsEvent::GetLatestComponentExplorerView(None))
        );
    }

    #[tokio::test]
    async fn test_supervisor_replaces_session_on_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let supervisor =
            tokio::spawn(Supervisor::new(PanelConfig::default()).run(listener, shutdown_rx));

        let mut first = port_from_tcp("agent-1", TcpStream::connect(address).await.unwrap());
        assert_eq!(next_event(&mut first).await, Some(DevtoolsEvent::Handshake()));
        assert_eq!(
            next_event(&mut first).await,
            Some(DevtoolsEvent::QueryTargetAvailability())
        );

        let mut second = port_from_tcp("agent-2", TcpStream::connect(address).await.unwrap());
        assert_eq!(next_event(&mut second).await, Some(DevtoolsEvent::Handshake()));

        // The stale session says goodbye and hangs up.
        assert_eq!(next_event(&mut first).await, Some(DevtoolsEvent::Shutdown()));
        assert_eq!(next_event(&mut first).await, None);

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), supervisor)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(
            next_event(&mut second).await,
            Some(DevtoolsEvent::QueryTargetAvailability())
        );
        assert_eq!(next_event(&mut second).await, Some(DevtoolsEvent::Shutdown()));
        assert_eq!(next_event(&mut second).await, None);
    }
}
