//! Diff a mapped record against an existing endpoint record.
//!
//! # Usage
//!
//! ```bash
//! syncline diff -f users.yaml -r source.json -e existing.json
//! ```

use std::path::PathBuf;

use clap::Args;
use syncline_connector::operation::{AttributeDiff, DiffEntry};
use syncline_provisioning::{EvaluatorConfig, RhaiEvaluator};

use crate::error::CliResult;
use crate::input::{load_record, load_workflow};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Workflow definition
    #[arg(short = 'f', long = "file", value_name = "WORKFLOW")]
    pub file: PathBuf,

    /// Source record (JSON object)
    #[arg(short = 'r', long = "record", value_name = "RECORD")]
    pub record: PathBuf,

    /// Existing endpoint record (JSON object)
    #[arg(short = 'e', long = "existing", value_name = "EXISTING")]
    pub existing: PathBuf,
}

pub fn run(args: &DiffArgs) -> CliResult<AttributeDiff> {
    let config = load_workflow(&args.file)?;
    let record = load_record(&args.record)?;
    let existing = load_record(&args.existing)?;
    let evaluator = RhaiEvaluator::with_config(EvaluatorConfig::from_env()?);

    let mapped = config.mapper.map(&record, &evaluator)?;
    Ok(config.mapper.get_diff(&mapped, &existing))
}

pub fn execute(args: DiffArgs, json: bool) -> CliResult<()> {
    let diff = run(&args)?;
    if json {
        return super::print_json(&diff);
    }

    if diff.is_empty() {
        println!("No changes");
        return Ok(());
    }
    for (name, entry) in diff.iter() {
        let action = entry.action().to_string();
        match entry {
            DiffEntry::Replace(value) => {
                println!("{action:<8} {name} = {}", super::render(value));
            }
            DiffEntry::Remove => println!("{action:<8} {name}"),
            DiffEntry::Add(values) => {
                let rendered: Vec<String> = values.iter().map(super::render).collect();
                println!("{action:<8} {name} += {}", rendered.join(", "));
            }
        }
    }
    Ok(())
}
