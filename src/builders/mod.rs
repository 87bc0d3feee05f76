//! Builders to construct launcher components from configuration.

pub mod factory_builder;

pub use factory_builder::{build_factory, build_launchers};
