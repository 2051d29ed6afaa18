//! Step definitions for server registry behaviour scenarios.

mod then;
pub mod world;
