//! Command-line interface built on clap.
//!
//! [`Cli`] carries the global flags (--config, --seed, --verbose) and the
//! [`Command`] subcommands: generate, catalog, workflow.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{Backend, DEFAULT_CONFIG_FILE};

/// ncgen: synthetic non-conformity ticket generator.
#[derive(Debug, Parser)]
#[command(name = "ncgen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Seed for reproducible output.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Debug-level logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the ticket set and write the JSON and CSV files.
    Generate {
        /// Total ticket count before per-category truncation.
        #[arg(long)]
        total: Option<usize>,

        /// First possible open date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last possible open date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Where comments and descriptions come from.
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Chat model for the llm backend.
        #[arg(long)]
        model: Option<String>,

        /// Retries for transient backend failures.
        #[arg(long)]
        max_retries: Option<u32>,

        /// JSON output path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// CSV output path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show the category catalog and how many tickets each category gets.
    Catalog {
        #[arg(long)]
        total: Option<usize>,
    },

    /// Show the steps of a workflow (the default one when omitted).
    Workflow { name: Option<String> },
}
