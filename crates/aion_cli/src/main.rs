//! Aion CLI — the command-line interface for the Aion FPGA toolchain.
//!
//! Provides `aion init` for project scaffolding, `aion lint` for static analysis,
//! `aion sim` for running individual testbench simulations, and `aion test` for
//! discovering and running all testbenches in a project.

#![warn(missing_docs)]

mod init;
mod lint;
mod pipeline;
mod sim;
mod test;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Aion — a fast, unified FPGA toolchain.
#[derive(Parser, Debug)]
#[command(name = "aion", version, about = "Aion FPGA Toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `aion.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Aion project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes in
        /// the current directory.
        name: Option<String>,

        /// HDL language for the template files.
        #[arg(short, long, value_enum, default_value_t = HdlLanguage::SystemVerilog)]
        lang: HdlLanguage,

        /// Target device part number.
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Run lint checks on the current project.
    Lint(LintArgs),
    /// Run a single testbench simulation.
    Sim(SimArgs),
    /// Discover and run all testbenches.
    Test(TestArgs),
}

/// Arguments for the `aion lint` subcommand.
#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Rule names to suppress (e.g., `--allow unused-signal`).
    #[arg(long, num_args = 1..)]
    pub allow: Vec<String>,

    /// Rule names to promote to errors (e.g., `--deny naming-violation`).
    #[arg(long, num_args = 1..)]
    pub deny: Vec<String>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Target name to select from `aion.toml`.
    #[arg(short, long)]
    pub target: Option<String>,
}

/// Arguments for the `aion sim` subcommand.
#[derive(Parser, Debug)]
pub struct SimArgs {
    /// Testbench file path or module name.
    pub testbench: String,

    /// Simulation time limit (e.g., "100ns", "1us", "10ms").
    #[arg(long)]
    pub time: Option<String>,

    /// Waveform output format.
    #[arg(long, value_enum)]
    pub waveform: Option<WaveformFormat>,

    /// Output path for waveform file.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable waveform recording.
    #[arg(long)]
    pub no_waveform: bool,

    /// Override top module name (default: inferred from file stem).
    #[arg(long)]
    pub top: Option<String>,

    /// Launch interactive REPL debugger instead of running to completion.
    #[arg(short, long)]
    pub interactive: bool,
}

/// Arguments for the `aion test` subcommand.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Specific testbench name to run (optional).
    pub name: Option<String>,

    /// Substring filter for testbench names.
    #[arg(long)]
    pub filter: Option<String>,

    /// Waveform output format for all testbenches.
    #[arg(long, value_enum)]
    pub waveform: Option<WaveformFormat>,

    /// Disable waveform recording for all testbenches.
    #[arg(long)]
    pub no_waveform: bool,
}

/// Waveform output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WaveformFormat {
    /// Value Change Dump (IEEE 1364).
    Vcd,
    /// Fast Signal Trace (GTKWave).
    Fst,
    /// GHDL Waveform.
    Ghw,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// HDL language selection for project scaffolding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HdlLanguage {
    /// VHDL-2008.
    Vhdl,
    /// Verilog-2005.
    Verilog,
    /// SystemVerilog-2017.
    #[value(name = "systemverilog")]
    SystemVerilog,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => atty_is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { name, lang, target } => init::run(name, lang, target),
        Command::Lint(ref args) => lint::run(args, &global),
        Command::Sim(ref args) => sim::run(args, &global),
        Command::Test(ref args) => test::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Rough terminal detection — checks if stdout is a terminal.
fn atty_is_terminal() -> bool {
    // Use a simple heuristic: check the TERM env var.
    // In a real build we'd use the `is-terminal` crate, but this is
    // sufficient for now.
    std::env::var("TERM").is_ok()
}
