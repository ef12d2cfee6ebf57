//! The client-facing surface (components C9/C10): per-call option
//! builders, configuration, the command queue, the engine task that owns
//! the connection, and the [`Client`] handle callers actually hold.

pub mod config;
mod command;
mod engine;
mod events;
mod handle;
pub mod options;

pub use events::Event;
pub use handle::Client;
