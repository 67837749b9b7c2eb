//! Low-level building blocks for the store.
//!
//! Includes the key hash strategies and positional file I/O.

/// Key hash strategies and bucket index derivation.
pub mod hash;

/// I/O abstractions and utilities.
///
/// Interfaces for positional reads and writes against the page file.
pub mod io;
