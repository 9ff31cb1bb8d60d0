//! Core traits for qexec

mod client;
mod from_value;
mod to_value;

pub use client::Client;
pub use from_value::FromValue;
pub use to_value::ToValue;
