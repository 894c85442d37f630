//! Output formatting for CLI commands.

use std::io::Write;

use crate::cli::args::{OutputFormat, RelataArgs};
use crate::document::StoredValue;
use crate::error::Result;
use crate::similar::projector::SimilarResponse;

/// Print a response to stdout in the requested format.
pub fn output_result(response: &SimilarResponse, args: &RelataArgs) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_response(&mut out, response, args.output_format, args.pretty)
}

/// Write a response in the given format.
pub fn write_response<W: Write>(
    out: &mut W,
    response: &SimilarResponse,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match format {
        OutputFormat::Human => write_human(out, response),
        OutputFormat::Json => write_json(out, response, pretty),
    }
}

fn write_json<W: Write>(out: &mut W, response: &SimilarResponse, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, response)?;
    } else {
        serde_json::to_writer(&mut *out, response)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_human<W: Write>(out: &mut W, response: &SimilarResponse) -> Result<()> {
    writeln!(
        out,
        "Documents similar to '{}' (mode: {}, {} found)",
        response.source_id, response.mode, response.num_found
    )?;

    for (rank, doc) in response.docs.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "{}. score {:.4} (vector {:.4}, lexical {:.4})",
            rank + 1,
            doc.score,
            doc.vector_score,
            doc.lexical_score
        )?;
        for (name, value) in &doc.fields {
            writeln!(out, "   {name}: {}", format_value(value))?;
        }
    }

    Ok(())
}

fn format_value(value: &StoredValue) -> String {
    value
        .values()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
