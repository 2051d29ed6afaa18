//! Serverdeck: a local registry of ISP server bookmarks.
//!
//! This crate keeps an ordered, persisted list of server endpoints with
//! favorites, tags, usage statistics and connectivity results, and answers
//! filtered and sorted views over it.
//!
//! # Architecture
//!
//! Serverdeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure registry logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and connectivity probes
//! - **Adapters**: Concrete implementations of ports (in-memory, directory)
//!
//! # Modules
//!
//! - [`registry`]: Server records, views, mutations and persistence

pub mod registry;
