//! # isa-conditions
//!
//! Command-line front end for the condition engine. Loads extension and
//! parameter definitions from a directory of YAML files (`--arch`), then
//! answers questions about conditions written in the condition grammar:
//!
//! ```sh
//! # Is the condition satisfiable once implications and conflicts are applied?
//! isa-conditions --arch arch/ check "extension: { name: C }" --witness
//!
//! # Do two conditions hold in the same configurations?
//! isa-conditions --arch arch/ equiv "not: { anyOf: [ ... ] }" "allOf: [ ... ]"
//!
//! # Yes / no / maybe against a configuration file
//! isa-conditions --arch arch/ eval @cond.yaml --config cfg.yaml
//!
//! # Print the expanded tree as YAML, JSON, IDL, text or DIMACS
//! isa-conditions --arch arch/ render @cond.yaml --format idl
//! ```
//!
//! Logging goes through `env_logger`; `--debug` lowers the default level and
//! `RUST_LOG` overrides it.

use clap::{CommandFactory, Parser};
use command_line::cli::{Cli, Commands};

mod command_line {
    pub(crate) mod cli;
}

/// Global allocator using `tikv-jemallocator`, also the source of the memory
/// statistics.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    let cli = Cli::parse();

    let level = if cli.common.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = command_line::cli::run(cli) {
        eprintln!("error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}
