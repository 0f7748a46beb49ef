//! boxed error type shared by everything that can fail.
//!
//! The Send + Sync bounds are there so errors can cross the thread boundary
//! between the streaming loop and whatever consumes its status channel.
pub type BoxError = std::boxed::Box<
    dyn std::error::Error // must implement Error to satisfy ?
        + std::marker::Send // needed for threads
        + std::marker::Sync, // needed for threads
>;
