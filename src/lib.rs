#![recursion_limit = "256"]

pub mod error;
pub mod domain;
pub mod data;
pub mod ml;
pub mod embedding;
pub mod infra;
pub mod application;
pub mod cli;

pub use error::{EmbedError, Result};
