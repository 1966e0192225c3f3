//! Comparison charts for FFT benchmark results.
//!
//! Result files are small CSV tables (`size, rate, scaled rate` under a header
//! naming the series). Every chart overlays whichever of its candidate files
//! exist on one logarithmic size axis and is written as an svg.

pub mod charts;
pub mod config;
pub mod figure;
pub mod series;
