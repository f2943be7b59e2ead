//! # dbdialog
//!
//! Command-line host of the dialog compiler: configuration, schema
//! snapshot loading and the subcommands that drive `dbdialog-core`.

pub mod cli;
pub mod config;
