//! # Taskboard
//!
//! Task tracking with recurring templates and a declarative filter/sort
//! pipeline, persisted as JSON files in a local data directory.
//!
//! * [`schedule`] computes the next run of a daily, weekly or monthly rule.
//! * [`templates`] keeps recurring templates and records their runs.
//! * [`filter`] narrows and orders a task collection.
//! * [`tasks`] owns task identity and the tag vocabulary.
//! * [`storage`] is the key-value persistence both stores are built on.

pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod storage;
pub mod tasks;
pub mod templates;
pub mod tui;

pub use error::{Error, Result};
