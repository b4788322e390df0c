//! Built-in upload stages, in pipeline order.

pub mod count;
pub mod entries;
pub mod event_keys;
pub mod file_type;
pub mod parse;
pub mod presence;

pub use count::CountStage;
pub use entries::EntriesStage;
pub use event_keys::EventKeysStage;
pub use file_type::FileTypeStage;
pub use parse::ParseStage;
pub use presence::PresenceStage;
