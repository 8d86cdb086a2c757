//! Catalog used by the unit tests of this crate.

shared_types::event_catalog! {
    /// Topics of the unit-test catalog.
    pub enum TestTopic;

    /// Events of the unit-test catalog.
    pub enum TestEvent {
        Reset() => "reset" @Critical,
        Navigated(url: String) => "navigated" @Critical,
        Request(id: u32) => "request",
        Refresh(revision: u32) => "refresh",
        Frame(index: u32) => "frame" @Background,
        Highlight(index: u32) => "highlight" @Background,
    }
}
