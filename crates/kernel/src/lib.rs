//! Tessera kernel library.
//!
//! Lets arbitrary host records own an ordered collection of typed content
//! blocks, and lets editors snapshot, export, import, and restore the full
//! set of children as a portable, tamper-evident blob. The surrounding
//! application provides storage, permissions, and the web surface; this
//! crate provides the relationship model and the snapshot pipeline.

pub mod access;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod storage;

pub use config::Config;
pub use error::{KernelError, KernelResult};
