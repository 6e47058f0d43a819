// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! esmbridge CLI - inspect how sources and built-ins look to the ES module
//! emulation layer

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use esmbridge_runtime::modules::util::{InspectOptions, inspect};
use esmbridge_runtime::{Loader, Options, Value};
use esmbridge_syntax::{LineIndex, SourceType, TopLevel, parse_module};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "esmbridge",
    about = "ES module emulation tools",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Report the top-level declarations and insertion point of a file
    Analyze {
        /// Source file
        file: PathBuf,

        /// Parse under script rules instead of module rules
        #[arg(long)]
        script: bool,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// List built-in modules, or the exports of one
    Builtins {
        /// Built-in id, with or without `node:`
        id: Option<String>,
    },
    /// Show the package options that apply to a path
    Options {
        /// File or directory to look up from
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose {
        "esmbridge=debug,esmbridge_runtime=debug,esmbridge_syntax=debug"
    } else {
        "esmbridge=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Analyze { file, script, json } => analyze(&file, script, json),
        Command::Builtins { id } => builtins(id.as_deref()),
        Command::Options { path } => options(&path),
    }
}

fn analyze(file: &Path, script: bool, json: bool) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let source_type = if script {
        SourceType::Script
    } else {
        SourceType::Module
    };
    debug!(file = %file.display(), ?source_type, bytes = source.len(), "analyzing");

    let program = match parse_module(&source, source_type) {
        Ok(program) => program,
        Err(error) => {
            eprintln!(
                "{}:{}:{}: {}: {}",
                file.display(),
                error.line,
                error.column,
                "SyntaxError".red().bold(),
                error.message
            );
            return Ok(ExitCode::FAILURE);
        }
    };
    let Some(top) = program.top else {
        anyhow::bail!("analysis produced no result for {}", file.display());
    };
    debug!(
        identifiers = top.identifiers.names().count(),
        insert_index = top.insert_index,
        "analysis finished"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&top)?);
    } else {
        print_top_level(&source, &top);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_top_level(source: &str, top: &TopLevel) {
    let lines = LineIndex::new(source);
    let (line, column) = lines.location(top.insert_index);

    println!("{}", "IDENTIFIERS:".white().bold());
    for name in top.identifiers.names() {
        let provenance = top
            .identifiers
            .get(name)
            .map(|provenance| format!("{:?}", provenance))
            .unwrap_or_default();
        let imported = if top.imported_bindings.contains(name) {
            " (import)"
        } else {
            ""
        };
        println!("    {:20} {}{}", name.cyan(), provenance.dimmed(), imported);
    }
    println!();

    println!(
        "{} {} (line {}, column {}) prefix {:?}",
        "INSERT AT:".white().bold(),
        top.insert_index.yellow(),
        line,
        column,
        top.insert_prefix
    );
    if let Some(position) = top.first_await_outside_function {
        println!("{} {}", "TOP-LEVEL AWAIT:".white().bold(), position.yellow());
    }
}

fn builtins(id: Option<&str>) -> anyhow::Result<ExitCode> {
    let loader = Loader::new(Options::default());

    let Some(id) = id else {
        for id in loader.builtins().ids() {
            println!("{}", id.green());
        }
        return Ok(ExitCode::SUCCESS);
    };

    debug!(id, "importing built-in");
    let namespace = match loader.import_builtin(id) {
        Ok(namespace) => namespace,
        Err(error) => {
            eprintln!("{}: {}", error.name().red().bold(), error.message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let options = InspectOptions {
        depth: Some(0),
        ..InspectOptions::default()
    };
    for name in namespace.keys() {
        let value = namespace.get(&name)?.unwrap_or(Value::Undefined);
        println!("    {:24} {}", name.cyan(), inspect(&value, &options).dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

fn options(path: &Path) -> anyhow::Result<ExitCode> {
    let path = std::fs::canonicalize(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    let found = Options::find_for(&path)?;
    debug!(path = %path.display(), found = found.is_some(), "package options");
    let options = found.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(ExitCode::SUCCESS)
}
