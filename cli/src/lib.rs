//! Boxes CLI library: command definitions and output helpers.

pub mod commands;
pub mod output;
