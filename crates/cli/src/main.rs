mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use newton_core::{serialize, CompilationSession, CompileOptions, NewtonError};
use serde::{Deserialize, Serialize};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Newton physical-invariant language front end.
#[derive(Parser)]
#[command(name = "newton", version, about = "Newton physical-invariant language front end")]
struct Cli {
    /// Output format (text or json); defaults to the config file, then text
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a newton.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log compiler activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .nt file and report whether it is dimensionally consistent
    Check {
        /// Path to the .nt source file
        file: PathBuf,
        /// Keep going after an error and report every broken rule
        #[arg(long)]
        recover: bool,
    },

    /// Compile a .nt file and print its dimensions, physics and invariants as JSON
    Dump {
        /// Path to the .nt source file
        file: PathBuf,
    },

    /// Print the token stream of a .nt file
    Tokens {
        /// Path to the .nt source file
        file: PathBuf,
    },

    /// Show one physics quantity of a compiled .nt file
    Physics {
        /// Path to the .nt source file
        file: PathBuf,
        /// Identifier or unit name of the quantity
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output.unwrap_or(OutputFormat::Text), cli.quiet);
            process::exit(1);
        }
    };
    let output = cli
        .output
        .or(config.output.format)
        .unwrap_or(OutputFormat::Text);

    match cli.command {
        Commands::Check { file, recover } => {
            let mut options = config.compile.clone();
            options.recover |= recover;
            cmd_check(&file, &options, output, cli.quiet);
        }
        Commands::Dump { file } => {
            cmd_dump(&file, &config.compile, output, cli.quiet);
        }
        Commands::Tokens { file } => {
            cmd_tokens(&file, output, cli.quiet);
        }
        Commands::Physics { file, name } => {
            cmd_physics(&file, &name, &config.compile, output, cli.quiet);
        }
    }
}

// ── Subcommands ──────────────────────────────────────────────────────────────

fn cmd_check(file: &Path, options: &CompileOptions, output: OutputFormat, quiet: bool) {
    let session = compile_or_exit(file, options, output, quiet);
    if session.has_errors() {
        for e in session.diagnostics() {
            report_diagnostic(e, output, quiet);
        }
        process::exit(1);
    }

    let symbols = session.symbols();
    match output {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "status": "ok",
                "file": session.filename(),
                "dimensions": symbols.dimensions().len(),
                "physics": symbols.all_physics().len(),
                "invariants": session.invariants().len(),
            });
            println!("{}", pretty(&summary));
        }
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "ok: {} dimensions, {} physics, {} invariants",
                    symbols.dimensions().len(),
                    symbols.all_physics().len(),
                    session.invariants().len()
                );
            }
        }
    }
}

fn cmd_dump(file: &Path, options: &CompileOptions, output: OutputFormat, quiet: bool) {
    let session = compile_or_exit(file, options, output, quiet);
    for e in session.diagnostics() {
        report_diagnostic(e, output, quiet);
    }
    println!("{}", pretty(&serialize::to_json(&session)));
    if session.has_errors() {
        process::exit(1);
    }
}

fn cmd_tokens(file: &Path, output: OutputFormat, quiet: bool) {
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_diagnostic(&NewtonError::io(file, &e), output, quiet);
            process::exit(1);
        }
    };
    let tokens = match newton_core::lex(&src, &file.display().to_string()) {
        Ok(t) => t,
        Err(e) => {
            report_diagnostic(&e, output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let list: Vec<_> = tokens
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "kind": format!("{:?}", t.token.kind()),
                        "text": t.token.to_string(),
                        "line": t.line,
                        "column": t.column,
                    })
                })
                .collect();
            println!("{}", pretty(&serde_json::Value::Array(list)));
        }
        OutputFormat::Text => {
            for t in &tokens {
                println!("{}:{}\t{:?}\t{}", t.line, t.column, t.token.kind(), t.token);
            }
        }
    }
}

fn cmd_physics(
    file: &Path,
    name: &str,
    options: &CompileOptions,
    output: OutputFormat,
    quiet: bool,
) {
    let session = compile_or_exit(file, options, output, quiet);
    let Some(physics) = session.physics_by_name(name) else {
        report_error(&format!("no physics named '{}'", name), output, quiet);
        process::exit(1);
    };

    match output {
        OutputFormat::Json => {
            let value = serialize::serialize_physics(session.symbols(), physics);
            println!("{}", pretty(&value));
        }
        OutputFormat::Text => {
            println!("{}", physics.identifier.as_deref().unwrap_or(name));
            println!("  unit:        {}", physics.unit_string());
            println!(
                "  numerator:   {} ({} dimensions)",
                physics.numerator_prime_product(),
                physics.number_of_numerators()
            );
            println!(
                "  denominator: {} ({} dimensions)",
                physics.denominator_prime_product(),
                physics.number_of_denominators()
            );
            println!("  id:          {}", physics.id);
            println!("  vector:      {}", physics.is_vector);
            if let Some(value) = physics.value {
                println!("  value:       {}", value);
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn compile_or_exit(
    file: &Path,
    options: &CompileOptions,
    output: OutputFormat,
    quiet: bool,
) -> CompilationSession {
    match newton_core::compile_path(file, options) {
        Ok(session) => session,
        Err(e) => {
            report_diagnostic(&e, output, quiet);
            process::exit(1);
        }
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e))
}

fn report_diagnostic(e: &NewtonError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => eprintln!("{}", pretty(&e.to_json_value())),
        OutputFormat::Text => eprintln!("{}", e),
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
