//! This module contains the engine that expands and evaluates derivatives.
//!
//! It includes the `Differentiator` and the `EngineOptions` used to configure it.

mod implementation;
mod options;

pub use implementation::Differentiator;
pub use options::EngineOptions;
