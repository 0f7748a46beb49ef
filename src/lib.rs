//! spokemeter - bicycle spoke tension analyzer
//!
//! Estimates the fundamental vibration frequency of a plucked spoke from a
//! stream of 16-bit audio blocks and converts it into wire tension with a
//! taut-wire linear-mass-density model.  The [`TensionEngine`] runs the
//! detection pipeline once per block; the [`StreamController`] feeds it from
//! a [`analyzer::source::BlockSource`] and publishes readouts.
extern crate json;
#[macro_use]
extern crate num_derive;

pub mod analyzer;
pub mod common;
pub mod dsp;
pub mod tension;

pub use analyzer::controller::StreamController;
pub use analyzer::engine::TensionEngine;
pub use analyzer::param_message::ParamMessage;
pub use analyzer::settings::AnalyzerSettings;
