//! # sensordb-adapter-dom-memory
//!
//! A small arena-backed element tree implementing the
//! [`Document`](sensordb_app::ports::Document) port.
//!
//! Handles are indices into the arena, so cloning the [`MemoryDocument`] or an
//! [`ElementRef`] is cheap. Clearing an element frees its former children for
//! reuse, together with their click handlers.
//! Clicks are simulated with [`MemoryDocument::click`], which runs the
//! registered handlers and returns their combined future.

mod html;
mod tree;

pub use tree::{ElementRef, MemoryDocument};
