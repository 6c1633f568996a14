//! stackfork Command Line
//!
//! Library side of the `stackfork` binary: configuration loading and the file
//! handling behind each subcommand.
//!
//! # Core Concepts
//!
//! - [`CliConfig`]: optional TOML configuration, every field defaulted
//! - [`rename_file`]: rename one compose file and render it as YAML or JSON
//! - [`randomize_into`]: write a renamed compose file plus its env file into a
//!   directory

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod config;

pub use commands::{
    randomize_into, read_document, rename_file, render, write_file, CommandError, RenameRequest,
    COMPOSE_FILE_NAME, ENV_FILE_NAME,
};
pub use config::{CliConfig, ConfigError, LogFormat, OutputFormat};
