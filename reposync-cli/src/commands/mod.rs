//! CLI command implementations

pub mod inspect;
pub mod sync;

pub use inspect::InspectArgs;
pub use sync::SyncArgs;
