//! Streaming side of the crate: validated settings, the per-block engine,
//! the fundamental resolver, audio sources, and the controller loop.
pub mod controller;
pub mod engine;
pub mod param_message;
pub mod resolver;
pub mod settings;
pub mod source;
