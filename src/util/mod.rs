//! Small helpers shared across modules that don't belong to any single
//! protocol component.

pub mod client_id;
