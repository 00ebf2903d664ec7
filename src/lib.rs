#![warn(non_snake_case)]

pub mod config;
pub mod options;
pub mod report;
pub mod sim;

pub use sim::{Problem, SimError};
