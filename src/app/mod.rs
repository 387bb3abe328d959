//! The application code, used when running yase as a standalone emulator.
//!
//! Runs a ROM for a number of frames, optionally on a separate emulation thread, and can write
//! a screenshot or a quicksave at the end.
//! Settings are read from a YAML file (see [Config]).
//! All of the actual SNES emulation is done by importing from [core][crate::core].
mod config;
pub use config::Config;
mod runner;
pub use runner::EmuThread;
pub mod utils;
