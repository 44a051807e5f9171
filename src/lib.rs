//! # code-assist
//!
//! Explain, generate and translate code snippets with language models.
//!
//! ## Features
//!
//! - Source language detection through a remote classifier
//! - Per-task model selection for Ollama and OpenAI-compatible backends
//! - Robust extraction of code from fenced model output
//!
//! ## Quick Start
//!
//! ```rust
//! use code_assist::assist::extract_code;
//!
//! let code = extract_code("```python\nprint(1)\n```", None).unwrap();
//! assert_eq!(code, "print(1)");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod assist;
pub mod cli;
pub mod config;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of code-assist.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
