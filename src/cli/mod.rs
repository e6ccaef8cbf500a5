//! Command-line front end and the sample controller

mod commands;
pub mod controller;

pub use commands::{Cli, Commands};
