//! Process primitives for the Rigel supervision core
//!
//! This module provides the OS-dependent surface of the supervisor:
//! spawning a shell command into its own process group, signaling the
//! whole group, and polling exit status without blocking.
//!
//! ## Platform Support
//!
//! - **Unix**: Full support with process groups for safe cleanup
//! - **Windows**: Not yet implemented (would use Job Objects)
//!
//! ## Safety
//!
//! The implementation prioritizes safe process management by:
//! - Placing every spawned job in its own process group
//! - Providing both graceful and forceful termination of the whole group
//! - Discarding child stdio so a job can never block on an undrained pipe

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::*;
