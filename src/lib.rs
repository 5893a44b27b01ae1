//! lineage - random people hierarchies rendered through a graph engine bridge.
//!
//! The host generates a degree-bounded random hierarchy of people and draws it
//! on a visualization engine. The engine reports clicked nodes back as integer
//! ids through a selection callback.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod host;
pub mod models;
