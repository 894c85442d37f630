//! Command implementations for the Relata CLI.

use std::time::Instant;

use tracing::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{RelataError, Result};
use crate::index::loader::JsonlLoader;
use crate::index::memory::{MemoryIndex, MemoryIndexConfig};
use crate::similar::config::SimilarConfig;
use crate::similar::engine::SimilarEngine;
use crate::similar::projector::SimilarResponse;

/// Execute a CLI command.
pub fn execute_command(args: RelataArgs) -> Result<()> {
    match &args.command {
        Command::Similar(similar_args) => {
            let response = find_similar(similar_args)?;
            output_result(&response, &args)
        }
    }
}

/// Load the documents and run one similarity request.
pub fn find_similar(args: &SimilarArgs) -> Result<SimilarResponse> {
    let mut config = match &args.config {
        Some(path) => SimilarConfig::from_file(path)?,
        None => SimilarConfig::default(),
    };
    if args.parallel {
        config.parallel_retrieval = true;
    }

    let vector_field = args
        .vector_field
        .clone()
        .unwrap_or_else(|| config.default_vector_field.clone());

    let index = MemoryIndex::new(MemoryIndexConfig {
        unique_key_field: config.unique_key_field.clone(),
        ..Default::default()
    });
    let loader = JsonlLoader::new(&config.unique_key_field).with_vector_field(vector_field);

    let start = Instant::now();
    let documents = loader.load_file(&index, &args.docs)?;
    info!(
        documents,
        elapsed_ms = start.elapsed().as_millis() as u64,
        path = %args.docs.display(),
        "loaded documents"
    );

    let engine = SimilarEngine::new(config);
    engine
        .process(&index.snapshot(), &args.to_params())?
        .ok_or_else(|| RelataError::invalid_argument("--id must not be empty"))
}
