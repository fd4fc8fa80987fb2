//! # provkit-core
//!
//! Core protocol implementation for the STM32 configuration menu.
//!
//! This crate provides the low-level protocol primitives:
//! - Command code definitions and data-line encoding
//! - Line framing and lenient text decoding
//! - Reply parsers
//! - Protocol constants

pub mod command;
pub mod constants;
pub mod error;
pub mod line;
pub mod parse;

pub use command::{data_line, Command};
pub use error::{Error, Result};
pub use line::{decode_lenient, LineBuffer};
