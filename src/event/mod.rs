// Event routing core
//
// Inbound client events are validated into `InboundEvent`, then the `EventBus`
// persists them and fans them out to the members of their session.

// Public API - what other modules can use
pub use bus::{EventBus, DEFAULT_SESSION};
pub use errors::BusError;
pub use events::{ActorPayload, ChatPayload, InboundEvent, StrokePayload};

// Internal modules
mod bus;
mod errors;
mod events;
