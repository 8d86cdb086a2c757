//! What the panel currently knows about the inspected target.

use devtools_catalog::DevtoolsEvent;

/// Target facts learned from inbound traffic.
///
/// Everything except the profiler counter is forgotten when the target
/// navigates or the port closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetStatus {
    pub connected: bool,
    /// `None` until the agent answers the availability query.
    pub available: Option<bool>,
    pub framework_version: Option<String>,
    pub url: Option<String>,
    /// Nodes in the last component forest received.
    pub component_count: Option<usize>,
    pub profiler_frames: u64,
}

impl TargetStatus {
    pub(crate) fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Fold one inbound event. Returns true if anything changed.
    pub fn apply(&mut self, event: &DevtoolsEvent) -> bool {
        let before = self.clone();
        match event {
            DevtoolsEvent::TargetAvailability(available, version) => {
                self.available = Some(*available);
                self.framework_version.clone_from(version);
            }
            DevtoolsEvent::TargetNavigated(url) => {
                *self = Self {
                    connected: self.connected,
                    url: Some(url.clone()),
                    profiler_frames: self.profiler_frames,
                    ..Self::default()
                };
            }
            DevtoolsEvent::LatestComponentExplorerView(view) => {
                self.component_count = Some(view.node_count());
            }
            DevtoolsEvent::ProfilerFrame(_) => self.profiler_frames += 1,
            DevtoolsEvent::PortClosed() => {
                *self = Self {
                    profiler_frames: self.profiler_frames,
                    ..Self::default()
                };
            }
            _ => {}
        }
        *self != before
    }
}
