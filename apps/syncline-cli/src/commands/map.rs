//! Map one record through a workflow's attribute definitions.

use std::path::PathBuf;

use clap::Args;
use syncline_connector::operation::Record;
use syncline_provisioning::{EvaluatorConfig, RhaiEvaluator};

use crate::error::CliResult;
use crate::input::{load_record, load_workflow};

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Workflow definition
    #[arg(short = 'f', long = "file", value_name = "WORKFLOW")]
    pub file: PathBuf,

    /// Source record (JSON object)
    #[arg(short = 'r', long = "record", value_name = "RECORD")]
    pub record: PathBuf,
}

pub fn run(args: &MapArgs) -> CliResult<Record> {
    let config = load_workflow(&args.file)?;
    let record = load_record(&args.record)?;
    let evaluator = RhaiEvaluator::with_config(EvaluatorConfig::from_env()?);

    Ok(config.mapper.map(&record, &evaluator)?)
}

pub fn execute(args: MapArgs, json: bool) -> CliResult<()> {
    let mapped = run(&args)?;
    if json {
        return super::print_json(&mapped);
    }

    if mapped.is_empty() {
        println!("(no attributes resolved)");
    }
    for (name, value) in &mapped {
        println!("{name} = {}", super::render(value));
    }
    Ok(())
}
