//! PHA CLI library.
//!
//! This crate provides the command-line interface and interactive loop for
//! the Personal Health Agent.

pub mod cli;
pub mod commands;
pub mod display;
pub mod interactive;
