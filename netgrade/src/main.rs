use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ios_config_core::{diff_with_options, format_json, DiffOptions};
use netgrade::grade::{grade, GradeRequest};
use netgrade::identity::AddressRewriter;
use netgrade::inspect::render_tree;
use netgrade::normalize::{parse_device, ParsedDevice};
use netgrade::report::{render_grading, render_summary, render_text};
use netgrade::summary::Envelope;
use netgrade::telemetry::init_tracing;

mod cli;

use cli::{Cli, Command, DiffArgs, GradeArgs, InspectArgs, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Grade(args) => run_grade(args),
        Command::Inspect(args) => run_inspect(args),
        Command::Diff(args) => run_diff(args),
    }
}

fn run_grade(args: GradeArgs) -> Result<()> {
    let request = GradeRequest {
        master: args.master,
        student: args.student,
        master_neighbors: optional_path(&args.master_neighbors),
        student_neighbors: optional_path(&args.student_neighbors),
        hint: args.birthday_prefix,
        master_prefix: args.master_prefix,
        assignment: args.assignment,
        profiles: args.profiles_file,
    };
    let result = grade(&request);

    if args.error_envelope {
        let envelope = Envelope::from_result(result);
        match (args.format, &envelope) {
            (OutputFormat::Text, Envelope::Success(summary)) => {
                println!("{}", render_grading(summary));
            }
            _ => println!("{}", serde_json::to_string_pretty(&envelope)?),
        }
        return Ok(());
    }

    let summary = result.with_context(|| {
        format!(
            "failed to grade {} against {}",
            request.student.display(),
            request.master.display()
        )
    })?;
    match args.format {
        OutputFormat::Text => println!("{}", render_grading(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let device = load_device(&args.file)?;

    match args.format {
        OutputFormat::Text => {
            print!("{}", render_tree(&device.tree, args.depth));
            for line in &device.unparsed {
                println!("unparsed line {}: {}", line.line, line.text);
            }
        }
        OutputFormat::Json => {
            let report = InspectReport {
                config: &device.config,
                unparsed: &device.unparsed,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn run_diff(args: DiffArgs) -> Result<()> {
    let left = load_device(&args.file1)?;
    let right = load_device(&args.file2)?;

    let opts = DiffOptions {
        include_identical: args.identical,
        ..DiffOptions::ios()
    };
    let entries = diff_with_options(&left.tree, &right.tree, &opts);

    if args.summary {
        println!("{}", render_summary(&entries));
        return Ok(());
    }
    match args.format {
        OutputFormat::Text => println!("{}", render_text(&entries)),
        OutputFormat::Json => println!("{}", format_json(&entries)),
    }
    Ok(())
}

fn load_device(path: &Path) -> Result<ParsedDevice> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_device(&text, &AddressRewriter::identity())
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Neighbour archives are positional; an empty argument means none.
fn optional_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

#[derive(Debug, serde::Serialize)]
struct InspectReport<'a> {
    config: &'a netgrade::normalize::model::NormalizedConfig,
    unparsed: &'a [netgrade::normalize::UnparsedLine],
}
