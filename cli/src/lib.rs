//! Rigel CLI library
//!
//! The presentation layer of the Rigel job supervisor: shell-input
//! parsing and job-table rendering. All supervision behavior lives in
//! `rigel-core`; this crate consumes only its snapshot and operation
//! surface.

pub mod display;
pub mod error;
pub mod shell;

pub use error::{CliError, Result};
pub use shell::{parse_line, ShellCommand};
