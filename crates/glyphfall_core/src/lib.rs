//! # GLYPHFALL Core
//!
//! Host-independent building blocks for the glyph field:
//! - OKLCH color math and the background gradient
//! - Frame scheduling as `schedule(callback) -> cancelable handle`
//! - Frame statistics
//!
//! Nothing in here knows what a canvas is. The particle crate plugs these
//! into a drawing surface; tests plug them into a fake clock.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod color;
pub mod schedule;
pub mod stats;

pub use color::{Gradient, Oklch, Rgb};
pub use schedule::{FrameCallback, FrameHandle, FrameScheduler, ManualScheduler};
pub use stats::FpsMeter;
