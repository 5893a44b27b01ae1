//! Host ↔ engine bridge.
//!
//! The host builds a graph on a visualization engine through four asynchronous
//! calls and learns about clicks through a selection callback. Nodes are
//! addressed by small integer ids; engine handles never leave the engine side.
//!
//! # Architecture
//!
//! - `IdBridge`: id table, selection resolution and engine calls (engine side)
//! - `BridgeServer`: serves one host connection on top of an `IdBridge`
//! - `BridgeClient`: typed calls plus notification routing (host side)
//! - `CallbackRegistry`: selection handlers addressed by callback target
//! - `protocol` / `transport`: msgpack-RPC messages and length-prefixed framing

mod callbacks;
mod client;
mod error;
mod id_bridge;
mod identity;
pub mod protocol;
mod selection;
mod server;
pub mod transport;

pub use callbacks::{CallbackRegistry, CallbackTarget};
pub use client::BridgeClient;
pub use error::BridgeError;
pub use id_bridge::{IdBridge, DEFAULT_LAYOUT_ANIMATION};
pub use identity::IdentityMap;
pub use protocol::{RemoteError, SelectedPerson, NO_SELECTION};
pub use selection::SelectionNotifier;
#[cfg(unix)]
pub use server::listen_unix;
pub use server::BridgeServer;
