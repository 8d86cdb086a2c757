//! # Connection Supervisor
//!
//! Accepts agent connections and keeps exactly one live session. A new
//! connection replaces the current session; the old one is closed first so
//! its queued traffic and subscriptions are discarded.

use std::io;

use inspector_telemetry::SESSIONS_OPENED;
use port_bridge::{port_from_tcp, Port};
use shared_bus::BusError;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::PanelConfig;
use crate::metrics::SessionMetrics;
use crate::session::InspectorSession;

/// Owns the current session.
pub struct Supervisor {
    config: PanelConfig,
    session: Option<InspectorSession>,
    metrics: SessionMetrics,
}

impl Supervisor {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            config,
            session: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn current(&self) -> Option<&InspectorSession> {
        self.session.as_ref()
    }

    /// Replace the current session with one bound to `port`.
    pub fn adopt(&mut self, port: Port) -> Result<&InspectorSession, BusError> {
        if let Some(previous) = self.session.take() {
            self.metrics.record(&previous);
            info!(session = %previous.id(), "Replacing session for reconnecting agent");
            previous.close();
        }
        self.metrics.reset();

        let session = InspectorSession::open(port, &self.config)?;
        inspector_telemetry::metric_inc!(SESSIONS_OPENED);
        Ok(&*self.session.insert(session))
    }

    /// Publish the current session's counters.
    pub fn record_metrics(&mut self) {
        match &self.session {
            Some(session) => self.metrics.record(session),
            None => self.metrics.record_idle(),
        }
    }

    /// Accept connections until `shutdown` flips to true.
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> io::Result<()> {
        let address = listener.local_addr()?;
        info!(%address, "Waiting for agent connections");

        let mut ticker = tokio::time::interval(self.config.metrics_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "Agent connected");
                        let port = port_from_tcp(&peer.to_string(), stream);
                        if let Err(err) = self.adopt(port) {
                            warn!(%peer, error = %err, "Failed to open session");
                        }
                    }
                    Err(err) => warn!(error = %err, "Accept failed"),
                },
                _ = ticker.tick() => self.record_metrics(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Close the current session, if any.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            self.metrics.record(&session);
            session.close();
        }
        self.metrics.record_idle();
        info!("Supervisor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtools_catalog::DevtoolsEvent;
    use port_bridge::{port_pair, ConnectionState};
    use shared_types::Events;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let mut supervisor = Supervisor::new(PanelConfig::default());

        let (panel_a, mut agent_a) = port_pair("agent-a");
        let first = supervisor.adopt(panel_a).unwrap().id();

        let greeting = timeout(Duration::from_secs(1), agent_a.inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(greeting.topic, "handshake");

        let (panel_b, _agent_b) = port_pair("agent-b");
        let second = supervisor.adopt(panel_b).unwrap().id();
        assert_ne!(first, second);

        // The old agent hears the rest of the greeting, a shutdown, then EOF.
        let mut topics = Vec::new();
        while let Some(message) = timeout(Duration::from_secs(1), agent_a.inbound.recv())
            .await
            .unwrap()
        {
            topics.push(message.topic);
        }
        assert_eq!(topics, vec!["queryNgAvailability", "shutdown"]);

        let current = supervisor.current().unwrap();
        assert_eq!(current.state(), ConnectionState::Connected);
        supervisor.shutdown();
        assert!(supervisor.current().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(Supervisor::new(PanelConfig::default()).run(listener, shutdown_rx));

        let stream = tokio::net::TcpStream::connect(address).await.unwrap();
        let mut agent = port_from_tcp("agent", stream);
        let greeting = timeout(Duration::from_secs(2), agent.inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            DevtoolsEvent::from_wire(greeting).unwrap(),
            DevtoolsEvent::Handshake()
        );

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
