//! Validate a workflow definition.
//!
//! Loads the document, applies every definition-time check and compiles each
//! expression (guard and attribute sources, including unwound ones) without
//! running it.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use syncline_connector::mapping::{AttributeDefinition, Source};
use syncline_provisioning::RhaiEvaluator;

use crate::error::{CliError, CliResult};
use crate::input::load_workflow;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Workflow definition (YAML, or JSON with a .json extension)
    #[arg(short = 'f', long = "file", value_name = "WORKFLOW")]
    pub file: PathBuf,
}

/// Summary of a valid workflow.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub name: String,
    pub collection: String,
    pub endpoint: String,
    pub ensure: String,
    pub identifiers: Vec<String>,
    pub attributes: Vec<String>,
    pub relations: Vec<String>,
    pub expressions: usize,
}

pub fn run(args: &ValidateArgs) -> CliResult<ValidationReport> {
    let config = load_workflow(&args.file)?;
    let evaluator = RhaiEvaluator::new();

    let mut expressions = Vec::new();
    if let Some(condition) = &config.condition {
        expressions.push(("condition".to_string(), condition.as_str()));
    }
    for definition in config.mapper.definitions() {
        collect_expressions(definition, &definition.name, &mut expressions);
    }

    for (location, code) in &expressions {
        if let Some(error) = evaluator.validate(code).into_iter().next() {
            return Err(CliError::Expression {
                location: location.clone(),
                message: error.message,
            });
        }
    }

    Ok(ValidationReport {
        name: config.name.clone(),
        collection: config.collection.clone(),
        endpoint: config.endpoint.clone(),
        ensure: config.ensure.to_string(),
        identifiers: config.identifiers.clone(),
        attributes: config.mapper.output_names(),
        relations: config.mapper.relations().map(|d| d.name.clone()).collect(),
        expressions: expressions.len(),
    })
}

fn collect_expressions<'a>(
    definition: &'a AttributeDefinition,
    location: &str,
    out: &mut Vec<(String, &'a str)>,
) {
    for source in &definition.sources {
        if let Source::Expression(code) = source {
            out.push((format!("attribute '{location}'"), code.as_str()));
        }
    }
    if let Some(nested) = &definition.unwind {
        collect_expressions(nested, &format!("{location}.unwind"), out);
    }
}

pub fn execute(args: ValidateArgs, json: bool) -> CliResult<()> {
    let report = run(&args)?;
    if json {
        return super::print_json(&report);
    }

    println!("Workflow '{}' is valid", report.name);
    println!("  collection:  {}", report.collection);
    println!("  endpoint:    {}", report.endpoint);
    println!("  ensure:      {}", report.ensure);
    if !report.identifiers.is_empty() {
        println!("  identifiers: {}", report.identifiers.join(", "));
    }
    println!("  attributes:  {}", report.attributes.join(", "));
    if !report.relations.is_empty() {
        println!("  relations:   {}", report.relations.join(", "));
    }
    Ok(())
}
