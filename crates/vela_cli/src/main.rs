//! Vela CLI — the command-line interface for the Vela RTL toolchain.
//!
//! Provides `vela opt-const` for running the constant-folding peephole
//! optimizer over a JSON netlist document.

#![warn(missing_docs)]

mod netlist_doc;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use netlist_doc::DesignDoc;
use vela_common::Interner;
use vela_ir::Selection;
use vela_opt::{OptConfig, OptConstPass, Pass};

/// Vela — an RTL synthesis toolchain.
#[derive(Parser, Debug)]
#[command(name = "vela", version, about = "Vela RTL Toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Perform constant folding on internal cell types.
    OptConst(OptConstArgs),
}

/// Arguments for the `vela opt-const` subcommand.
#[derive(Parser, Debug)]
pub struct OptConstArgs {
    /// Input netlist document (JSON).
    pub input: PathBuf,

    /// Output path for the optimized netlist; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove undef inputs from `$mux`, `$pmux` and `$_MUX_` cells.
    #[arg(long)]
    pub mux_undef: bool,

    /// Replace `$mux` cells with inverters or buffers when possible.
    #[arg(long)]
    pub mux_bool: bool,

    /// Replace undriven nets with undef (x) constants.
    #[arg(long)]
    pub undriven: bool,

    /// Restrict the pass to the named modules (repeatable).
    #[arg(long = "module", value_name = "NAME")]
    pub modules: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let code = match &cli.command {
        Command::OptConst(args) => run_opt_const(args),
    };
    process::exit(code);
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_opt_const(args: &OptConstArgs) -> i32 {
    let text = match std::fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", args.input.display());
            return 1;
        }
    };
    let doc: DesignDoc = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("error: {} is not a netlist document: {err}", args.input.display());
            return 1;
        }
    };
    let interner = Interner::new();
    let mut design = match doc.to_design(&interner) {
        Ok(design) => design,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    let selection = if args.modules.is_empty() {
        Selection::full()
    } else {
        Selection::of_modules(args.modules.iter().map(|name| interner.intern(name)))
    };
    let config = OptConfig {
        mux_undef: args.mux_undef,
        mux_bool: args.mux_bool,
        undriven: args.undriven,
    };
    let changed = OptConstPass::new(config).run(&mut design, &selection, &interner);
    log::debug!(
        "opt_const {} the design",
        if changed { "changed" } else { "did not change" }
    );

    let out = DesignDoc::from_design(&design, &interner);
    let json = match serde_json::to_string_pretty(&out) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("error: cannot serialize netlist: {err}");
            return 1;
        }
    };
    match &args.output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, json + "\n") {
                eprintln!("error: cannot write {}: {err}", path.display());
                return 1;
            }
        }
        None => println!("{json}"),
    }
    0
}
