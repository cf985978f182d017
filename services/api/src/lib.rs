//! services/api/src/lib.rs
//!
//! The HTTP service crate: configuration, adapters for the core ports, the
//! planning pipeline, and the Axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod web;
