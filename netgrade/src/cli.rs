use std::path::PathBuf;

use clap::{Parser, ValueEnum};

const FEEDBACK_ORDER: &str = "Feedback is grouped per device in device name order. Within a \
device it follows interface names, route prefixes and access-list ids in sorted order, \
not the line order of the master configuration.";

#[derive(Parser, Debug)]
#[command(name = "netgrade")]
#[command(about = "Grade student router configurations against a master set")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Grade a student archive against a master archive.
    #[command(after_help = FEEDBACK_ORDER)]
    Grade(GradeArgs),
    /// Show how a single configuration file is understood.
    Inspect(InspectArgs),
    /// Compare two configuration files structurally.
    Diff(DiffArgs),
}

#[derive(Parser, Debug)]
pub struct GradeArgs {
    /// Zip archive with the instructor configurations.
    pub master: PathBuf,
    /// Zip archive with the student configurations.
    pub student: PathBuf,
    /// Zip archive with master `show ip ospf neighbor` output, or "".
    pub master_neighbors: String,
    /// Zip archive with student `show ip ospf neighbor` output, or "".
    pub student_neighbors: String,
    /// The student's two-octet prefix, for example 212.05.
    pub birthday_prefix: String,
    /// Rewrite personal addresses onto this prefix instead of the student's.
    #[arg(long)]
    pub master_prefix: Option<String>,
    /// Assignment type (detected from the master archive when omitted).
    #[arg(long)]
    pub assignment: Option<String>,
    /// TOML file replacing the built-in assignment profiles.
    #[arg(long)]
    pub profiles_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Report failures as a JSON error document instead of an exit status.
    #[arg(long)]
    pub error_envelope: bool,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Tree depth shown in text output.
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
}

#[derive(Parser, Debug)]
pub struct DiffArgs {
    pub file1: PathBuf,
    pub file2: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print only the counts.
    #[arg(long)]
    pub summary: bool,
    /// Include identical commands.
    #[arg(long)]
    pub identical: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
