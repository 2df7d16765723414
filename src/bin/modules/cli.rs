use clap::{ArgAction, Args, Parser, ValueEnum};
use std::path::PathBuf;

const ABOUT: &str = "A command-line tool for exact analytic derivatives of the nuclear repulsion energy.";
const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser)]
#[command(version, about = ABOUT, help_template = HELP_TEMPLATE)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input file containing molecular structure in XYZ format.
    ///
    /// Use '-' to read from standard input. The first line holds the number of atoms, the second
    /// a comment, followed by one line per atom with an element symbol (or atomic number) and
    /// x, y, z coordinates. Nuclear charges are taken from the atomic numbers.
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub derivative: DerivativeOptions,

    #[command(flatten)]
    pub output: OutputOptions,

    #[command(flatten)]
    pub engine: EngineOverrides,
}

/// Options selecting what is computed.
#[derive(Args)]
#[command(next_help_heading = "Derivative Options")]
pub struct DerivativeOptions {
    /// What to compute.
    #[arg(short, long, value_enum, default_value_t = Task::Derivative)]
    pub task: Task,

    /// Comma-separated differentiation variables for the `derivative` task, e.g. `x0,y1,y1`.
    ///
    /// Each variable is an axis letter followed by an atom index (0-based). Repeats give higher
    /// derivatives. With no variables the zero-order energy is reported.
    #[arg(short, long, value_name = "VARS", value_delimiter = ',')]
    pub wrt: Vec<String>,

    /// Also print the expanded symbolic expression as LaTeX (derivative task only).
    #[arg(long)]
    pub latex: bool,
}

/// Options for controlling the output format and destination.
#[derive(Args)]
#[command(next_help_heading = "Output Options")]
pub struct OutputOptions {
    /// Output file path.
    ///
    /// If not specified, results are written to standard output.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format for the results.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Number of decimal places to display for floating-point values.
    #[arg(short, long, default_value_t = 8)]
    pub precision: usize,
}

/// Options overriding the engine configuration.
#[derive(Args)]
#[command(next_help_heading = "Engine Options")]
pub struct EngineOverrides {
    /// Engine configuration file in TOML format.
    ///
    /// Recognized keys are `parallel_threshold` and `max_terms`. Command-line values below take
    /// precedence over the file.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Abort if any differentiation step produces more than this many terms.
    #[arg(long, value_name = "N")]
    pub max_terms: Option<usize>,

    /// Minimum number of terms before a differentiation step runs in parallel.
    #[arg(long, value_name = "N")]
    pub parallel_threshold: Option<usize>,
}

/// The quantity to compute.
#[derive(Clone, Copy, ValueEnum)]
pub enum Task {
    /// A single (possibly mixed, possibly zero-order) partial derivative.
    Derivative,
    /// All 3N first derivatives.
    Gradient,
    /// The 3N x 3N matrix of second derivatives.
    Hessian,
}

/// Output format for the calculation results.
#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed tables.
    Pretty,
    /// Comma-separated values.
    Csv,
    /// A JSON document.
    Json,
}
