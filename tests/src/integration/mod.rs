//! Integration tests across the bus, scheduler, adapter and runtime crates.

pub mod batching;
pub mod disconnect;
pub mod priority_link;
pub mod session_flow;

#[cfg(test)]
pub(crate) mod support {
    use devtools_catalog::DevtoolsEvent;
    use port_bridge::Port;
    use shared_types::Events;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Next event the agent end of `port` receives.
    pub async fn next_event(port: &mut Port) -> Option<DevtoolsEvent> {
        let message = timeout(Duration::from_secs(2), port.inbound.recv())
            .await
            .expect("timed out waiting for the panel")?;
        Some(DevtoolsEvent::from_wire(message).expect("panel sent an undecodable message"))
    }

    /// Post `event` from the agent end of `port`.
    pub fn post(port: &Port, event: &DevtoolsEvent) {
        port.sink
            .post(event.to_wire().expect("encodable event"))
            .expect("panel end is open");
    }
}
