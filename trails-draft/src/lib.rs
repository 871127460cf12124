pub mod draft;
pub mod session;

pub use draft::{Draft, DraftError, DraftStep, SearchQuery};
pub use session::{DraftSessions, MemorySessions, SessionResult};
