pub mod event_store;
pub mod layout;
pub mod models;

pub use event_store::{EventReplay, EventStore};
pub use layout::{LogLayout, SchemaVersion};
pub use models::{ClickEvent, format_timestamp, parse_timestamp};
