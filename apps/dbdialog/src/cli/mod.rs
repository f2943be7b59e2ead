//! # dbdialog CLI Module
//!
//! This module implements the CLI interface for dbdialog.
//!
//! ## Available Commands
//!
//! - `init` - Write a configuration file
//! - `status` - Show schema objects and their dialogs
//! - `create` - Generate every server object of a schema object
//! - `remove` - Delete the dialog and artifact of an object
//! - `sync` - Reconcile dialogs with the schema snapshot
//! - `show` - Print a dialog or one of its queries
//! - `check` - Validate a dialog's structural invariants
//! - `hash` - Compute the BLAKE3 fingerprint of a dialog document
//! - `query` - Create, duplicate, remove or recreate a query
//! - `update` - Create a partial update query
//! - `fk` - Add or remove a logical foreign key
//! - `relations` - Refresh or prune relations

mod commands;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand};
use dbdialog_core::DialogError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// dbdialog - schema-to-API dialog compiler
///
/// Generates and maintains CRUD API descriptors for the objects of a
/// database schema.
#[derive(Parser, Debug)]
#[command(name = "dbdialog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Data source name (overrides the config file)
    #[arg(long, global = true)]
    pub data_source: Option<String>,

    /// Directory of dialog documents (overrides the config file)
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Schema snapshot JSON (overrides the config file)
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Storage backend: "file" (JSON documents) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show schema objects and whether they have a dialog
    Status,

    /// Generate the dialog, queries and artifact of a schema object
    Create {
        /// Schema object name
        object: String,

        /// Object type (Table, View, Procedure, TableFunction, ScalarFunction);
        /// looked up in the schema when omitted
        #[arg(short = 't', long)]
        object_type: Option<String>,
    },

    /// Delete the dialog and artifact of an object
    Remove {
        /// Schema object name
        object: String,
    },

    /// Reconcile dialogs with the schema snapshot
    Sync {
        /// Object to sync; every object with a dialog when omitted
        object: Option<String>,
    },

    /// Print a dialog document, or one of its queries
    Show {
        /// Schema object name
        object: String,

        /// Query name
        #[arg(short = 'Q', long)]
        query: Option<String>,
    },

    /// Validate a dialog's structural invariants
    Check {
        /// Schema object name
        object: String,
    },

    /// Compute BLAKE3 cryptographic hash of a dialog document
    Hash {
        /// Schema object name
        object: String,
    },

    /// Manage individual queries
    Query {
        #[command(subcommand)]
        action: QueryCommands,
    },

    /// Create a partial update over a column subset
    Update {
        /// Schema object name
        object: String,

        /// Name of the update query
        name: String,

        /// Columns the update writes (comma-separated)
        #[arg(short = 'C', long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Custom "changed by" column, created when absent
        #[arg(long)]
        by: Option<String>,

        /// Custom "changed on" column, created when absent
        #[arg(long)]
        on: Option<String>,

        /// Keep a change-log table; defaults to {object}{name}Log
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        history: Option<String>,

        /// ReadByKey query the update form loads from
        #[arg(long, default_value = "ReadByKey")]
        read_by_key: String,
    },

    /// Manage logical foreign keys
    Fk {
        #[command(subcommand)]
        action: FkCommands,
    },

    /// Manage inferred relations
    Relations {
        #[command(subcommand)]
        action: RelationCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Add a query of the given type
    Create {
        object: String,

        /// Query type (Create, ReadList, AggregatedReadList, ReadByKey, UpdateByKey)
        #[arg(short = 't', long)]
        query_type: String,

        /// Query name; defaults to the type name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Copy a query under a new name
    Duplicate {
        object: String,
        name: String,
        copy: String,
    },

    /// Remove a query, its UI binding and its change log
    Remove { object: String, name: String },

    /// Rebuild a query from the current dialog
    Recreate { object: String, name: String },
}

#[derive(Subcommand, Debug)]
pub enum FkCommands {
    /// Declare a foreign key the database does not enforce
    Add {
        /// Foreign key name
        name: String,
        table: String,
        column: String,
        target_table: String,

        #[arg(default_value = "Id")]
        target_column: String,
    },

    /// Clear the foreign key of a column
    Remove { table: String, column: String },
}

#[derive(Subcommand, Debug)]
pub enum RelationCommands {
    /// Re-infer relations from the schema
    Refresh { object: String },

    /// Drop query references to vanished relations
    Prune { object: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), DialogError> {
    let config = AppConfig::load(&cli.config)?.with_overrides(
        cli.data_source,
        cli.store,
        cli.schema,
        cli.backend,
    );
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&cli.config, &config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Create {
            object,
            object_type,
        }) => cmd_create(&config, json_mode, &object, object_type.as_deref()),
        Some(Commands::Remove { object }) => cmd_remove(&config, &object),
        Some(Commands::Sync { object }) => cmd_sync(&config, json_mode, object.as_deref()),
        Some(Commands::Show { object, query }) => cmd_show(&config, &object, query.as_deref()),
        Some(Commands::Check { object }) => cmd_check(&config, json_mode, &object),
        Some(Commands::Hash { object }) => cmd_hash(&config, json_mode, &object),
        Some(Commands::Query { action }) => match action {
            QueryCommands::Create {
                object,
                query_type,
                name,
            } => cmd_query_create(&config, json_mode, &object, &query_type, name.as_deref()),
            QueryCommands::Duplicate { object, name, copy } => {
                cmd_query_duplicate(&config, &object, &name, &copy)
            }
            QueryCommands::Remove { object, name } => cmd_query_remove(&config, &object, &name),
            QueryCommands::Recreate { object, name } => {
                cmd_query_recreate(&config, json_mode, &object, &name)
            }
        },
        Some(Commands::Update {
            object,
            name,
            columns,
            by,
            on,
            history,
            read_by_key,
        }) => cmd_update(
            &config,
            json_mode,
            UpdateArgs {
                object,
                name,
                columns,
                by,
                on,
                history,
                read_by_key,
            },
        ),
        Some(Commands::Fk { action }) => match action {
            FkCommands::Add {
                name,
                table,
                column,
                target_table,
                target_column,
            } => cmd_fk_add(&config, &name, &table, &column, &target_table, &target_column),
            FkCommands::Remove { table, column } => cmd_fk_remove(&config, &table, &column),
        },
        Some(Commands::Relations { action }) => match action {
            RelationCommands::Refresh { object } => cmd_relations_refresh(&config, json_mode, &object),
            RelationCommands::Prune { object } => cmd_relations_prune(&config, json_mode, &object),
        },
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}
