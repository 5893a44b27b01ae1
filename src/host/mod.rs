//! Host side: drives the engine through a bridge client.

mod session;

pub use session::HostSession;
