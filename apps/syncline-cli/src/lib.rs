//! syncline CLI library
//!
//! Offline tooling for workflow definitions: validate a document, map a
//! record through it, or diff the mapped record against an existing endpoint
//! record. Nothing here talks to an endpoint or a canonical store.

pub mod commands;
pub mod error;
pub mod input;
pub mod logging;
