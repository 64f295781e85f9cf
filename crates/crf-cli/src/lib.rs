//! Library side of the `crf-builder` command: configuration, logging setup
//! and the form build pipeline.

pub mod config;
pub mod logging;
pub mod pipeline;
