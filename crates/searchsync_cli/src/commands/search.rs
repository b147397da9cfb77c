//! Search command implementation.

use super::{rebuild, Format, Workspace};
use crate::dataset::Dataset;
use crate::error::CliResult;
use searchsync_core::{Record, SyncConfig, TypeName};
use tracing::info;

/// How query tokens are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Every token must match.
    All,
    /// Any token may match.
    Any,
    /// The query is a token prefix.
    Prefix,
}

/// Indexes every type, then queries one.
pub fn execute(
    workspace: &Workspace,
    type_name: &str,
    query: &str,
    mode: Match,
) -> CliResult<Vec<Record>> {
    rebuild::execute(workspace, None)?;
    let type_name = TypeName::new(type_name);

    let records = match mode {
        Match::All => workspace.sync.search(&type_name, query)?,
        Match::Any => {
            let hits = workspace.engine.search_any(&type_name, query)?;
            workspace.sync.load_hits(&hits)?
        }
        Match::Prefix => {
            let hits = workspace.engine.search_prefix(&type_name, query)?;
            workspace.sync.load_hits(&hits)?
        }
    };
    info!(type_name = %type_name, query, mode = ?mode, hits = records.len(), "search finished");
    Ok(records)
}

/// Runs the search command.
pub fn run(
    dataset: &Dataset,
    config: SyncConfig,
    type_name: &str,
    query: &str,
    mode: Match,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = Workspace::open(dataset, config);
    let records = execute(&workspace, type_name, query, mode)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        Format::Text => {
            for record in &records {
                let id = workspace.sync.document_id(record)?;
                println!("{id}  {}", serde_json::to_string(record.attributes())?);
            }
            println!("{} hit(s)", records.len());
        }
    }
    Ok(())
}
