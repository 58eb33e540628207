//! Tasklink - a task dependency graph engine.
//!
//! This crate provides both a CLI application and a library that records
//! "task A depends on task B" relations, refuses any relation that would
//! form a cycle, and answers blocked/ready queries over the result.
//!
//! The in-process API is [`engine::DependencyEngine`]; the graph algorithms
//! it uses are pure functions in [`graph`].

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Application context and repository configuration
pub mod app;
pub mod config;

// Output formatting
pub mod output;
