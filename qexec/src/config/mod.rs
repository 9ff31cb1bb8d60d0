//! Connection settings

pub mod defaults;
mod settings;

pub use settings::ConnectionConfig;
