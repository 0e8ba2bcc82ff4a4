#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use isa_conditions::arch::config::HwConfig;
use isa_conditions::arch::database::ArchDb;
use isa_conditions::condition::Condition;
use isa_conditions::logic::node::LogicNode;
use isa_conditions::sat::cnf::Cnf;
use isa_conditions::sat::configs::SolverConfig;
use isa_conditions::sat::dpll::Dpll;
use isa_conditions::sat::solver::{SolutionStats, Solutions, SolveResult, Solver};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Command-line interface for querying conditions against an architecture
/// database.
///
/// Conditions are given inline as YAML (or JSON) text, or as `@path` to read
/// them from a file.
#[derive(Parser, Debug)]
#[command(name = "isa-conditions", version, about = "Evaluate and solve ISA requirement conditions")]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Decide whether a condition is satisfiable.
    Check {
        condition: String,

        /// Print a satisfying assignment of the condition's terms.
        #[arg(short, long, default_value_t = false)]
        witness: bool,

        /// Print the CNF handed to the solver, in DIMACS format.
        #[arg(long, default_value_t = false)]
        dimacs: bool,

        /// Check the condition as written, without implications or conflicts.
        #[arg(long, default_value_t = false)]
        minimal: bool,
    },

    /// Decide whether two conditions hold in exactly the same configurations.
    Equiv { a: String, b: String },

    /// Decide whether two conditions can hold at the same time.
    Compat { a: String, b: String },

    /// Evaluate a condition against a hardware configuration file.
    Eval {
        condition: String,

        /// YAML configuration with `type: fully_configured`,
        /// `partially_configured` or `unconfigured`.
        #[arg(short, long)]
        config: PathBuf,

        /// Add implied extension versions to a full configuration first.
        #[arg(long, default_value_t = false)]
        closure: bool,

        #[arg(long, default_value_t = false)]
        minimal: bool,
    },

    /// Print a condition's logic tree.
    Render {
        condition: String,

        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,

        #[arg(long, default_value_t = false)]
        minimal: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Yaml,
    Json,
    Idl,
    Text,
    Dimacs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Directory of extension and parameter definitions, searched recursively
    /// for `.yaml` files.
    #[arg(short, long, global = true)]
    pub(crate) arch: Option<PathBuf>,

    /// Enable debug logging. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) debug: bool,

    /// Print problem and search statistics after solving.
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) stats: bool,

    /// Solver time limit in seconds. Zero disables it.
    #[arg(long, global = true)]
    pub(crate) time_limit: Option<f64>,

    /// Give up after this many conflicts.
    #[arg(long, global = true)]
    pub(crate) conflict_limit: Option<usize>,
}

impl CommonOptions {
    pub(crate) fn solver_config(&self) -> SolverConfig {
        let config = SolverConfig::default().with_conflict_limit(self.conflict_limit);
        match self.time_limit {
            None => config,
            Some(secs) if secs <= 0.0 => config.with_time_limit(None),
            Some(secs) => config.with_time_limit(Some(Duration::from_secs_f64(secs))),
        }
    }

    /// # Errors
    ///
    /// If the definitions directory cannot be read or contains invalid
    /// documents.
    pub(crate) fn load_db(&self) -> Result<Arc<ArchDb>> {
        let db = match &self.arch {
            Some(dir) => ArchDb::load_dir(dir)
                .with_context(|| format!("loading definitions from {}", dir.display()))?,
            None => ArchDb::new(),
        };
        info!(
            "{} extensions and {} parameters loaded",
            db.extensions().count(),
            db.parameters().count()
        );
        Ok(Arc::new(db.with_solver_config(self.solver_config())))
    }
}

/// Reads a condition argument: inline YAML, or `@path`.
///
/// # Errors
///
/// If the file cannot be read or the condition does not parse.
pub(crate) fn read_condition(arg: &str, db: &Arc<ArchDb>) -> Result<Condition> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    Condition::from_yaml_str(&text, Arc::clone(db)).with_context(|| format!("parsing condition {arg:?}"))
}

/// Runs a parsed command line.
///
/// # Errors
///
/// Any failure loading inputs, building conditions, or an undecided solve.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let common = cli.common;
    match cli.command {
        Commands::Check {
            condition,
            witness,
            dimacs,
            minimal,
        } => check(&condition, witness, dimacs, minimal, &common),
        Commands::Equiv { a, b } => {
            let db = common.load_db()?;
            let (a, b) = (read_condition(&a, &db)?, read_condition(&b, &db)?);
            println!("{}", if a.equivalent(&b)? { "EQUIVALENT" } else { "DIFFERENT" });
            Ok(())
        }
        Commands::Compat { a, b } => {
            let db = common.load_db()?;
            let (a, b) = (read_condition(&a, &db)?, read_condition(&b, &db)?);
            println!("{}", if a.compatible(&b)? { "COMPATIBLE" } else { "INCOMPATIBLE" });
            Ok(())
        }
        Commands::Eval {
            condition,
            config,
            closure,
            minimal,
        } => eval(&condition, &config, closure, minimal, &common),
        Commands::Render {
            condition,
            format,
            minimal,
        } => render(&condition, format, minimal, &common),
        Commands::Completions { .. } => Ok(()),
    }
}

fn check(arg: &str, witness: bool, dimacs: bool, minimal: bool, common: &CommonOptions) -> Result<()> {
    let time = Instant::now();
    let db = common.load_db()?;
    let condition = read_condition(arg, &db)?;
    let tree = condition.to_logic_tree(!minimal)?;
    let cnf = tree.to_cnf();
    let parse_time = time.elapsed();

    if dimacs {
        print!("{cnf}");
    }

    let (result, solver_stats) = solve(cnf.clone(), common.solver_config());

    if common.stats {
        let (allocated, resident) = memory_usage()?;
        print_stats(parse_time, &cnf, &solver_stats, allocated, resident);
    }

    match result {
        SolveResult::Sat(solutions) => {
            verify_solution(&cnf, &solutions)?;
            println!("SATISFIABLE");
            if witness {
                print_witness(tree, db.solver_config())?;
            }
        }
        SolveResult::Unsat => println!("UNSATISFIABLE"),
        SolveResult::Unknown => bail!(
            "undecided after {} conflicts in {:.3}s",
            solver_stats.conflicts,
            solver_stats.elapsed.as_secs_f64()
        ),
    }
    Ok(())
}

fn print_witness(tree: &LogicNode, config: &SolverConfig) -> Result<()> {
    match tree.find_model(config)? {
        Some(model) => print!("{model}"),
        None => bail!("no model found for a satisfiable condition"),
    }
    Ok(())
}

fn eval(arg: &str, path: &Path, closure: bool, minimal: bool, common: &CommonOptions) -> Result<()> {
    let db = common.load_db()?;
    let condition = read_condition(arg, &db)?;
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = match HwConfig::from_yaml_str(&text)
        .with_context(|| format!("parsing configuration {}", path.display()))?
    {
        HwConfig::Full(full) if closure => HwConfig::Full(full.with_implied_closure(&db)?),
        other => other,
    };

    let result = config.evaluate(condition.to_logic_tree(!minimal)?, None);
    println!("{result}");
    Ok(())
}

fn render(arg: &str, format: Format, minimal: bool, common: &CommonOptions) -> Result<()> {
    let db = common.load_db()?;
    let condition = read_condition(arg, &db)?;
    let expand = !minimal;
    match format {
        Format::Yaml => print!("{}", serde_yaml::to_string(&condition.to_value(expand)?)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(&condition.to_value(expand)?)?),
        Format::Idl => println!("{}", condition.to_idl(expand)?),
        Format::Text => println!("{}", condition.to_logic_tree(expand)?),
        Format::Dimacs => print!("{}", condition.to_logic_tree(expand)?.to_cnf()),
    }
    Ok(())
}

/// Solves `cnf` with the DPLL solver, returning the result and search statistics.
pub(crate) fn solve(cnf: Cnf, config: SolverConfig) -> (SolveResult, SolutionStats) {
    debug!("solving {} clauses over {} variables", cnf.len(), cnf.num_vars.saturating_sub(1));
    let mut solver: Dpll = Dpll::new(cnf, config);
    let result = solver.solve();
    (result, solver.stats())
}

/// Checks a model against the CNF it was found for.
///
/// # Errors
///
/// If some clause is not satisfied.
pub(crate) fn verify_solution(cnf: &Cnf, solutions: &Solutions) -> Result<()> {
    if cnf.verify(solutions) {
        debug!("model verified against {} clauses", cnf.len());
        Ok(())
    } else {
        Err(anyhow!("solution failed verification"))
    }
}

/// Allocated and resident memory in MiB.
fn memory_usage() -> Result<(f64, f64)> {
    epoch::advance().map_err(|e| anyhow!("jemalloc epoch: {e}"))?;
    let allocated = stats::allocated::mib()
        .and_then(|mib| mib.read())
        .map_err(|e| anyhow!("jemalloc stats: {e}"))?;
    let resident = stats::resident::mib()
        .and_then(|mib| mib.read())
        .map_err(|e| anyhow!("jemalloc stats: {e}"))?;
    Ok((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Prints a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Prints a statistic line with its rate per second.
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
///
/// # Arguments
/// * `parse_time` - Time spent loading definitions and building the CNF.
/// * `cnf` - The CNF handed to the solver.
/// * `s` - `SolutionStats` collected by the solver.
/// * `allocated` - Allocated memory in MiB.
/// * `resident` - Resident memory in MiB.
pub(crate) fn print_stats(parse_time: Duration, cnf: &Cnf, s: &SolutionStats, allocated: f64, resident: f64) {
    let elapsed_secs = s.elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Build time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars.saturating_sub(1));
    stat_line("Clauses", cnf.len());
    stat_line("Literals", cnf.iter().map(|c| c.len()).sum::<usize>());

    println!("========================[ Search Statistics ]========================");
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================\n");
}
