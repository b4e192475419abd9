pub mod storage;
pub mod store;

pub use storage::{FilePreferenceStorage, MemoryPreferenceStorage, PreferenceStorage};
pub use store::{PreferenceState, PreferenceStore, SessionStart, StoreState};
