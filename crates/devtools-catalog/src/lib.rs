//! # Devtools Catalog
//!
//! Demo catalog spoken between the inspector panel and the agent running in
//! the inspected target. Illustrative only: enough topics to exercise every
//! priority class, the disconnect event and coalescing.
//!
//! ## Priority Table
//!
//! | Class | Topics |
//! |-------|--------|
//! | Critical | lifecycle: handshake, shutdown, availability, navigation, port closed |
//! | Normal | request/response traffic for the component explorer and profiler |
//! | Background | highlight overlays, router tree, dirty marks, profiler frames |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod model;

pub use model::{
    ComponentExplorerView, ComponentNode, DirectivePosition, ElementPosition, PropertyUpdate,
    ViewQuery,
};

use serde_json::Value;

shared_types::event_catalog! {
    /// Topics of the devtools protocol.
    pub enum DevtoolsTopic;

    /// Events of the devtools protocol.
    pub enum DevtoolsEvent {
        // Lifecycle
        Handshake() => "handshake" @Critical,
        Shutdown() => "shutdown" @Critical,
        QueryTargetAvailability() => "queryNgAvailability" @Critical,
        TargetAvailability(available: bool, version: Option<String>) => "ngAvailability" @Critical,
        TargetNavigated(url: String) => "targetNavigated" @Critical,
        /// Emitted locally by the port adapter, never sent over the wire.
        PortClosed() => "portClosed" @Critical,

        // Component explorer
        GetLatestComponentExplorerView(query: Option<ViewQuery>) => "getLatestComponentExplorerView" @Normal,
        LatestComponentExplorerView(view: ComponentExplorerView) => "latestComponentExplorerView" @Normal,
        GetNestedProperties(position: DirectivePosition, path: Vec<String>) => "getNestedProperties" @Normal,
        NestedProperties(position: DirectivePosition, properties: Value, path: Vec<String>) => "nestedProperties" @Normal,
        UpdateState(update: PropertyUpdate) => "updateState" @Normal,
        SetSelectedComponent(position: ElementPosition) => "setSelectedComponent" @Normal,

        // Profiler
        StartProfiling() => "startProfiling" @Normal,
        StopProfiling() => "stopProfiling" @Normal,
        ProfilerResults(frames: Vec<Value>) => "profilerResults" @Normal,
        ProfilerFrame(frame: Value) => "sendProfilerChunk" @Background,

        // Overlays and router
        HighlightComponent(position: ElementPosition) => "highlightComponent" @Background,
        RemoveHighlightOverlay() => "removeHighlightOverlay" @Background,
        ComponentTreeDirty() => "componentTreeDirty" @Background,
        GetRoutes() => "getRoutes" @Background,
        UpdateRouterTree(routes: Vec<Value>) => "updateRouterTree" @Background,
    }

    disconnected => PortClosed;
}

/// Requests where only the newest queued copy matters.
pub fn coalesced_topics() -> [DevtoolsTopic; 3] {
    [
        DevtoolsTopic::GetLatestComponentExplorerView,
        DevtoolsTopic::ComponentTreeDirty,
        DevtoolsTopic::GetRoutes,
    ]
}
