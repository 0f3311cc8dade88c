#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

#[cfg(test)]
extern crate alloc;

pub(crate) mod channel;
pub(crate) mod commands;
pub mod config;
pub mod http;
pub mod prompt;
pub mod responses;
pub mod stack;
pub mod wifi;

#[cfg(feature = "examples")]
pub mod example;

pub use channel::CommandError;
pub use commands::Encoding;

#[cfg(test)]
mod tests;
