// Public API - what other modules can use
pub use models::{Member, ANONYMOUS_USERNAME};
pub use registry::{InMemorySessionRegistry, SessionRegistry};

// Internal modules
pub mod models;
pub mod registry;
