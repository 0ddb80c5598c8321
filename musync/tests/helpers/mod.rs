//! Shared fixtures for musync integration tests

#![allow(dead_code)]

pub mod catalog;
pub mod fake_archive;

pub use catalog::*;
pub use fake_archive::*;
