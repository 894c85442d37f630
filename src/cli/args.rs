//! Command line argument parsing for the Relata CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::similar::config::{RequestParams, keys};

/// Relata - hybrid "more like this" retrieval
#[derive(Parser, Debug, Clone)]
#[command(name = "relata")]
#[command(about = "Find documents similar to a given document using vector and lexical similarity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RelataArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RelataArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Find documents similar to one document of a JSONL file
    Similar(SimilarArgs),
}

/// Arguments for a similarity request
#[derive(Parser, Debug, Clone)]
pub struct SimilarArgs {
    /// Documents to search, one JSON object per line
    #[arg(value_name = "DOCS_JSONL")]
    pub docs: PathBuf,

    /// Identifier of the source document
    #[arg(long)]
    pub id: String,

    /// Maximum number of similar documents
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Fusion mode: hybrid, vector_only or lexical_only
    #[arg(short = 'm', long)]
    pub mode: Option<String>,

    /// Vector weight in hybrid mode
    #[arg(long)]
    pub vector_weight: Option<f32>,

    /// Lexical weight in hybrid mode
    #[arg(long)]
    pub lexical_weight: Option<f32>,

    /// Vector field to compare
    #[arg(long)]
    pub vector_field: Option<String>,

    /// Fields used for lexical similarity (comma-separated)
    #[arg(long)]
    pub lexical_fields: Option<String>,

    /// Fields to return (comma-separated)
    #[arg(long)]
    pub fields: Option<String>,

    /// Filter expression, may be repeated
    #[arg(long = "fq", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Run vector and lexical retrieval in parallel
    #[arg(long)]
    pub parallel: bool,
}

impl SimilarArgs {
    /// Express the arguments as request parameters.
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.add(keys::ENABLED, "true").add(keys::ID, self.id.as_str());

        if let Some(count) = self.count {
            params.add(keys::COUNT, count.to_string());
        }
        if let Some(mode) = &self.mode {
            params.add(keys::MODE, mode.as_str());
        }
        if let Some(weight) = self.vector_weight {
            params.add(keys::VECTOR_WEIGHT, weight.to_string());
        }
        if let Some(weight) = self.lexical_weight {
            params.add(keys::LEXICAL_WEIGHT, weight.to_string());
        }
        if let Some(field) = &self.vector_field {
            params.add(keys::VECTOR_FIELD, field.as_str());
        }
        if let Some(fields) = &self.lexical_fields {
            params.add(keys::LEXICAL_FIELDS, fields.as_str());
        }
        if let Some(fields) = &self.fields {
            params.add(keys::RETURN_FIELDS, fields.as_str());
        }
        for filter in &self.filters {
            params.add(keys::FILTER, filter.as_str());
        }

        params
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
