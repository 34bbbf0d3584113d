//! # pulse-core
//!
//! Core types, traits, configuration, and error handling for the Pulse
//! daily SMS survey service.

pub mod config;
pub mod error;
pub mod model;
pub mod traits;
