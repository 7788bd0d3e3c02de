//! Server configuration.

mod settings;

pub use settings::*;
