//! # Inspector Session
//!
//! Everything tied to one agent connection:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ InspectorSession                               │
//! │                                                │
//! │  PriorityAwareBus ──► PortMessageBus ──► port  │
//! │        ▲                    │                  │
//! │        │ re-entrant emits   │ inbound batch    │
//! │        │                    ▼                  │
//! │   status handlers ◄── ChangeNotifier scope     │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! A session is never reused. When the agent reconnects the supervisor
//! closes the old session and opens a fresh one on the new port.

use std::sync::{Arc, Weak};

use devtools_catalog::{DevtoolsEvent, DevtoolsTopic, ViewQuery};
use parking_lot::Mutex;
use port_bridge::{AdapterStats, ChangeNotifier, ConnectionState, Port, PortMessageBus};
use shared_bus::{
    BusError, DrainMode, EventStream, MessageBus, PriorityAwareBus, SchedulerStats, Subscription,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PanelConfig;
use crate::status::TargetStatus;

/// The adapter as shared between the session and its scheduler.
pub type PanelAdapter = PortMessageBus<DevtoolsEvent>;

/// The bus application code emits on.
pub type PanelBus = PriorityAwareBus<DevtoolsEvent, Arc<PanelAdapter>>;

/// One live agent connection.
pub struct InspectorSession {
    id: Uuid,
    adapter: Arc<PanelAdapter>,
    bus: Arc<PanelBus>,
    notifier: Arc<ChangeNotifier>,
    status: Arc<Mutex<TargetStatus>>,
    driver: Option<JoinHandle<()>>,
    closed: bool,
    _subscriptions: Vec<Subscription>,
}

impl InspectorSession {
    /// Bind a fresh port and greet the agent.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(port: Port, config: &PanelConfig) -> Result<Self, BusError> {
        let id = Uuid::new_v4();
        let port_name = port.name.clone();

        let notifier = Arc::new(ChangeNotifier::new());
        let adapter = Arc::new(PortMessageBus::connect(port, Arc::clone(&notifier) as _));
        let bus = Arc::new(PriorityAwareBus::with_config(
            Arc::clone(&adapter),
            config.scheduler_config(),
        ));

        let driver = (config.scheduler.drain_mode == DrainMode::Deferred).then(|| {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move { bus.run().await })
        });

        let status = Arc::new(Mutex::new(TargetStatus::connected()));
        let subscriptions = track_target(id, &bus, &status)?;

        let session = Self {
            id,
            adapter,
            bus,
            notifier,
            status,
            driver,
            closed: false,
            _subscriptions: subscriptions,
        };

        session.bus.emit(DevtoolsEvent::Handshake())?;
        session.bus.emit(DevtoolsEvent::QueryTargetAvailability())?;

        inspector_telemetry::log_event!(info, id, "Inspector session opened", port = %port_name);
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bus for outbound traffic and inbound subscriptions.
    pub fn bus(&self) -> &Arc<PanelBus> {
        &self.bus
    }

    pub fn state(&self) -> ConnectionState {
        self.adapter.state()
    }

    pub fn status(&self) -> TargetStatus {
        self.status.lock().clone()
    }

    /// Receiver that wakes once per inbound batch.
    pub fn watch_changes(&self) -> watch::Receiver<u64> {
        self.notifier.subscribe()
    }

    pub fn adapter_stats(&self) -> AdapterStats {
        self.adapter.stats()
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.bus.stats()
    }

    /// Inbound events of one topic as an async stream.
    pub fn events(&self, topic: DevtoolsTopic) -> Result<EventStream<DevtoolsEvent>, BusError> {
        EventStream::subscribe(self.bus.as_ref(), topic)
    }

    /// Ask the agent for a fresh component tree.
    pub fn request_component_tree(&self, query: Option<ViewQuery>) -> Result<(), BusError> {
        self.bus
            .emit(DevtoolsEvent::GetLatestComponentExplorerView(query))
    }

    /// Resolve once the agent's port is gone.
    pub async fn wait_disconnected(&self) {
        self.adapter.disconnected().await;
    }

    /// Say goodbye to the agent and tear everything down.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed || self.bus.is_closed() {
            return;
        }
        self.closed = true;
        if self.state().is_connected() {
            if let Err(err) = self.bus.emit(DevtoolsEvent::Shutdown()) {
                debug!(session = %self.id, error = %err, "Shutdown notice not sent");
            }
            // Whichever pass is running forwards the notice before closing.
            self.bus.destroy_after_flush();
        } else {
            self.bus.destroy();
        }
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        info!(session = %self.id, "Inspector session closed");
    }
}

impl Drop for InspectorSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Keep `status` in sync with inbound traffic and react to availability.
fn track_target(
    id: Uuid,
    bus: &Arc<PanelBus>,
    status: &Arc<Mutex<TargetStatus>>,
) -> Result<Vec<Subscription>, BusError> {
    let mut subscriptions = Vec::new();

    for topic in [
        DevtoolsTopic::TargetAvailability,
        DevtoolsTopic::TargetNavigated,
        DevtoolsTopic::LatestComponentExplorerView,
        DevtoolsTopic::ProfilerFrame,
        DevtoolsTopic::PortClosed,
    ] {
        let status = Arc::clone(status);
        subscriptions.push(bus.subscribe(topic, move |event: &DevtoolsEvent| {
            status.lock().apply(event);
        })?);
    }

    // Once the target reports a framework, or its tree changes, ask for the
    // tree. Re-entrant: these emits are queued behind the running drain.
    let weak: Weak<PanelBus> = Arc::downgrade(bus);
    subscriptions.push(bus.subscribe(
        DevtoolsTopic::TargetAvailability,
        move |event: &DevtoolsEvent| {
            let DevtoolsEvent::TargetAvailability(true, _) = event else {
                return;
            };
            request_tree(id, &weak);
        },
    )?);

    let weak: Weak<PanelBus> = Arc::downgrade(bus);
    subscriptions.push(bus.subscribe(
        DevtoolsTopic::ComponentTreeDirty,
        move |_: &DevtoolsEvent| request_tree(id, &weak),
    )?);

    let closed_id = id;
    subscriptions.push(bus.once(
        DevtoolsTopic::PortClosed,
        shared_bus::Handler::new(move |_: &DevtoolsEvent| {
            warn!(session = %closed_id, "Agent port closed");
        }),
    )?);

    Ok(subscriptions)
}

fn request_tree(id: Uuid, bus: &Weak<PanelBus>) {
    let Some(bus) = bus.upgrade() else {
        return;
    };
    if let Err(err) = bus.emit(DevtoolsEvent::GetLatestComponentExplorerView(None)) {
        debug!(session = %id, error = %err, "Tree request not queued");
    }
}
