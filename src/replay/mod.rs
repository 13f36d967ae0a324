// Public API - what other modules can use
pub use handlers::{index, replay_session};
pub use service::ReplayBuilder;
pub use types::{LandingQuery, ReplayEvent, ReplayResponse};

// Internal modules
mod handlers;
mod service;
mod types;
