//! Rebuild command implementation.

use super::{Format, Workspace};
use crate::dataset::Dataset;
use crate::error::CliResult;
use searchsync_core::{RebuildReport, SyncConfig, TypeName};
use tracing::info;

/// Rebuilds one type, or every registered type when `type_name` is `None`.
pub fn execute(
    workspace: &Workspace,
    type_name: Option<&str>,
) -> CliResult<Vec<RebuildReport>> {
    let types = match type_name {
        Some(name) => vec![TypeName::new(name)],
        None => workspace.sync.blueprints().type_names(),
    };

    let mut reports = Vec::with_capacity(types.len());
    for type_name in &types {
        let report = workspace.sync.rebuild(type_name)?;
        info!(
            type_name = %type_name,
            indexed = report.indexed,
            removed = report.removed,
            missing = report.missing,
            "rebuilt type"
        );
        reports.push(report);
    }
    Ok(reports)
}

/// Runs the rebuild command.
pub fn run(
    dataset: &Dataset,
    config: SyncConfig,
    type_name: Option<&str>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = Workspace::open(dataset, config);
    let reports = execute(&workspace, type_name)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => {
            for report in &reports {
                println!(
                    "{:<16} indexed {:>6}  removed {:>6}  missing {:>6}  ({:.1?})",
                    report.type_name, report.indexed, report.removed, report.missing, report.elapsed
                );
            }
            println!();
            println!("Records in store:   {}", workspace.store.len());
            println!("Documents in index: {}", workspace.engine.document_count());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchsync_core::SyncError;
    use searchsync_testkit::TempDataset;

    fn workspace() -> Workspace {
        let file = TempDataset::people_and_articles();
        let dataset = Dataset::load(file.path()).unwrap();
        Workspace::open(&dataset, SyncConfig::default())
    }

    #[test]
    fn rebuild_one_type() {
        let ws = workspace();
        let reports = execute(&ws, Some("Person")).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!((reports[0].indexed, reports[0].removed), (1, 1));
        assert_eq!(ws.engine.document_count(), 1);
    }

    #[test]
    fn rebuild_all_types_in_name_order() {
        let ws = workspace();
        let reports = execute(&ws, None).unwrap();
        let names: Vec<_> = reports.iter().map(|r| r.type_name.as_str()).collect();
        assert_eq!(names, vec!["Article", "Draft", "Person"]);
        assert_eq!(ws.engine.document_count(), 3);
    }

    #[test]
    fn rebuild_unknown_type() {
        let ws = workspace();
        let err = execute(&ws, Some("Ghost")).unwrap_err();
        assert!(matches!(err, crate::error::CliError::Sync(SyncError::UnknownType { .. })));
    }
}
