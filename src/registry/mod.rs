//! Server bookmark registry.
//!
//! The registry keeps an ordered list of server bookmarks, answers filtered
//! and sorted views over it, and applies mutations that preserve the rank
//! invariant before persisting the whole collection. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
