// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Bytesmith command-line driver.
//!
//! **DDD Context:** Build System
//!
//! Reads a build plan, runs the subclass pipeline and prints the resulting
//! class file listing.

mod plan;

use std::fs;

use bytesmith_core::writer::DynamicType;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bytesmith: synthesise JVM subclasses from declarative build plans
#[derive(Debug, Parser)]
#[command(name = "bytesmith")]
#[command(about = "Synthesise JVM subclasses from build plans", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the subclass described by a plan and print its listing
    Build {
        /// Path to the plan file
        plan: Utf8PathBuf,

        /// Write the listing to this file instead of stdout
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Validate a plan without printing the listing
    Check {
        /// Path to the plan file
        plan: Utf8PathBuf,
    },
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let default_directive = directive_for_verbosity(cli.verbose);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Build { plan, output } => build(&plan, output.as_deref()),
        Command::Check { plan } => check(&plan),
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    // The binary's targets live under `bytesmith`, the pipeline's under `bytesmith_core`.
    match v {
        0 => "bytesmith=info,bytesmith_core=info",
        1 => "bytesmith=debug,bytesmith_core=debug",
        _ => "bytesmith=trace,bytesmith_core=trace",
    }
}

/// Loads the plan at `path` and runs the pipeline.
fn make(path: &Utf8Path) -> Result<DynamicType> {
    let plan = plan::load_plan(path)?;
    let builder = plan
        .builder()
        .wrap_err_with(|| format!("Failed to configure build from '{path}'"))?;
    let dynamic_type = builder
        .make(plan.subclass.resolution)
        .wrap_err_with(|| format!("Failed to build '{}'", plan.subclass.name))?;
    Ok(dynamic_type)
}

fn build(path: &Utf8Path, output: Option<&Utf8Path>) -> Result<()> {
    let dynamic_type = make(path)?;
    let listing = dynamic_type.listing();
    match output {
        Some(output) => {
            fs::write(output, format!("{listing}\n"))
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write listing '{output}'"))?;
            info!(path = %output, "listing written");
        }
        None => println!("{listing}"),
    }
    Ok(())
}

fn check(path: &Utf8Path) -> Result<()> {
    let dynamic_type = make(path)?;
    println!(
        "{}: ok ({} methods, {} fields)",
        dynamic_type.description.name,
        dynamic_type.class_file.methods.len(),
        dynamic_type.class_file.fields.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLAN: &str = r#"
[build]
class-file-version = 17

[[types]]
name = "a.Base"
constructors = [{ parameters = [] }]
methods = [{ name = "size", returns = "int" }]

[subclass]
name = "a.Sub"
superclass = "a.Base"

[[subclass.intercept]]
name = "size"
implementation = { kind = "fixed", value = 42 }
"#;

    fn write_plan(dir: &TempDir, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let plan = path.join("plan.toml");
        fs::write(&plan, content).unwrap();
        plan
    }

    #[test]
    fn directive_defaults() {
        assert_eq!(
            directive_for_verbosity(0),
            "bytesmith=info,bytesmith_core=info"
        );
        assert_eq!(
            directive_for_verbosity(1),
            "bytesmith=debug,bytesmith_core=debug"
        );
        assert_eq!(
            directive_for_verbosity(2),
            "bytesmith=trace,bytesmith_core=trace"
        );
    }

    #[test]
    fn cli_parses_build_command() {
        let cli = Cli::try_parse_from(["bytesmith", "-vv", "build", "plan.toml", "-o", "out.txt"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build { plan, output } => {
                assert_eq!(plan, "plan.toml");
                assert_eq!(output.as_deref(), Some(Utf8Path::new("out.txt")));
            }
            Command::Check { .. } => panic!("expected build command"),
        }
    }

    #[test]
    fn build_writes_listing() {
        let temp = TempDir::new().unwrap();
        let plan = write_plan(&temp, PLAN);
        let output = plan.with_file_name("Sub.txt");

        build(&plan, Some(&output)).unwrap();

        let listing = fs::read_to_string(&output).unwrap();
        assert!(listing.starts_with("// Java 17 (major 61)\npublic class a.Sub extends a.Base {"));
        assert!(listing.contains("public int size();"));
        assert!(listing.ends_with("}\n"));
    }

    #[test]
    fn check_accepts_valid_plan() {
        let temp = TempDir::new().unwrap();
        let plan = write_plan(&temp, PLAN);
        check(&plan).unwrap();
    }

    #[test]
    fn build_reports_pipeline_errors() {
        let temp = TempDir::new().unwrap();
        let plan = write_plan(
            &temp,
            r#"
[subclass]
name = "a.Sub"
superclass = "a.Missing"
"#,
        );
        let err = make(&plan).unwrap_err();
        assert!(err.to_string().contains("Failed to build 'a.Sub'"));
    }
}
