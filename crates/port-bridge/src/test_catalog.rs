//! Catalog used by the unit tests of this crate.

shared_types::event_catalog! {
    pub enum LinkTopic;

    pub enum LinkEvent {
        Update(key: String, value: u32) => "update",
        Frame(index: u32) => "frame" @Background,
        Closed() => "closed" @Critical,
    }

    disconnected => Closed;
}
