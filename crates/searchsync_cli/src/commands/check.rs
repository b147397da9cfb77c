//! Check command implementation.

use crate::dataset::Dataset;
use crate::error::CliError;
use searchsync_core::SyncConfig;

/// Runs the check command.
pub fn run(dataset: &Dataset, config: &SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    let problems = dataset.problems(config);

    println!("SearchSync Dataset Check");
    println!("========================");
    println!();
    println!("Blueprints: {}", dataset.blueprints.len());
    println!("Records:    {}", dataset.records.len());
    println!();

    if problems.is_empty() {
        println!("No problems found.");
        return Ok(());
    }

    for problem in &problems {
        println!("  - {problem}");
    }
    Err(CliError::Invalid {
        count: problems.len(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchsync_testkit::TempDataset;

    #[test]
    fn clean_dataset_passes() {
        let file = TempDataset::people_and_articles();
        let dataset = Dataset::load(file.path()).unwrap();
        assert!(run(&dataset, &SyncConfig::default()).is_ok());
    }

    #[test]
    fn problems_fail_the_check() {
        let file = TempDataset::write(&serde_json::json!({
            "records": [ { "type": "Person", "key": "1" } ]
        }));
        let dataset = Dataset::load(file.path()).unwrap();
        let err = run(&dataset, &SyncConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "dataset has 1 problem(s)");
    }
}
