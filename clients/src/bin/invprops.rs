//! `invprops`: inspects and resolves invprops scenario files.
//!
//! **Subcommands:**
//! - `describe <scenario>`: prints the schema (descriptors and links)
//! - `check <scenario>`: lints the schema and the host state after all
//!   assignments; exits non-zero if any check fails
//! - `resolve <scenario>`: applies the assignments and prints every resolved
//!   attribute, or only those named with `--attribute`
//!
//! **Usage:**
//! ```text
//! invprops [-v] describe clients/scenarios/conductivity.toml
//! invprops check clients/scenarios/conductivity.toml --format json
//! invprops resolve clients/scenarios/conductivity.toml -a rho -a rhoDeriv
//! ```
//!
//! Logging goes to stderr; `RUST_LOG` overrides the level chosen by `-v`.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use invprops::scenario::Scenario;
use invprops::serializer::{json, text};
use invprops::{check, CheckReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Inspect and resolve invprops scenario files.
#[derive(Parser)]
#[command(name = "invprops", about = "Inspect and resolve physical-property scenarios")]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the schema described by a scenario.
    Describe(Common),
    /// Lint the schema and the resolved host state.
    Check {
        #[command(flatten)]
        common: Common,
        /// Also list passing checks.
        #[arg(long)]
        all: bool,
    },
    /// Apply the assignments and print resolved attributes.
    Resolve {
        #[command(flatten)]
        common: Common,
        /// Attribute to print; repeatable. Prints everything when omitted.
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
}

#[derive(ClapArgs)]
struct Common {
    /// Path to the scenario TOML file.
    scenario: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Describe(common) => describe(&common),
        Command::Check { common, all } => run_check(&common, all),
        Command::Resolve { common, attributes } => resolve(&common, &attributes),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(common: &Common) -> Result<Scenario> {
    let scenario = Scenario::load(&common.scenario)?;
    info!(
        scenario = %scenario.name,
        path = %common.scenario.display(),
        assignments = scenario.assign.len(),
        "loaded scenario"
    );
    Ok(scenario)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output to JSON")?;
    println!("{out}");
    Ok(())
}

fn describe(common: &Common) -> Result<()> {
    let scenario = load(common)?;
    let schema = scenario
        .schema()
        .with_context(|| format!("invalid schema in {}", common.scenario.display()))?;
    match common.format {
        Format::Text => print!("{}", text::schema_to_text(&schema)),
        Format::Json => print_json(&json::schema_to_json(&schema))?,
    }
    Ok(())
}

fn run_check(common: &Common, all: bool) -> Result<()> {
    let scenario = load(common)?;
    let host = scenario.host()?;

    let mut report = CheckReport::new();
    report.extend(check::schema(host.schema()));
    report.extend(check::host(&host));

    match common.format {
        Format::Text => print!("{}", text::report_to_text(&report, all)),
        Format::Json => print_json(&json::report_to_json(&report))?,
    }

    if !report.all_passed() {
        eprintln!("Check FAILED: {} check(s) did not pass.", report.failure_count());
        process::exit(1);
    }
    Ok(())
}

fn resolve(common: &Common, attributes: &[String]) -> Result<()> {
    let scenario = load(common)?;
    let host = scenario.host()?;

    if attributes.is_empty() {
        return match common.format {
            Format::Text => {
                print!("{}", text::host_to_text(&host));
                Ok(())
            }
            Format::Json => print_json(&json::host_to_json(&host)),
        };
    }

    let mut resolved = Vec::with_capacity(attributes.len());
    for name in attributes {
        let value = host
            .get(name)
            .with_context(|| format!("cannot resolve `{name}`"))?;
        resolved.push((name.as_str(), value));
    }

    match common.format {
        Format::Text => {
            for (name, value) in &resolved {
                match value {
                    Some(v) => println!("{name} = {v}"),
                    None => println!("{name} = unset"),
                }
            }
        }
        Format::Json => {
            let mut out = serde_json::Map::new();
            for (name, value) in &resolved {
                let v = value.as_ref().map_or(serde_json::Value::Null, json::value_to_json);
                out.insert((*name).to_owned(), v);
            }
            print_json(&serde_json::Value::Object(out))?;
        }
    }
    Ok(())
}

