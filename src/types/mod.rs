pub mod identifiers;
pub mod state;

pub use identifiers::{ItemId, SetFingerprint};
pub use state::CompareState;
