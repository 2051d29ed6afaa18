//! Adapter implementations for registry persistence and connectivity ports.

pub mod directory;
pub mod memory;
