use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;

use lithium::solver::{Solution, Solver, Status};
use lithium::{plan, Built, LithiumResults, Result, Sizes, Variant};

#[cfg(not(any(
    feature = "gurobi",
    feature = "microlp",
    feature = "highs",
    feature = "coin_cbc"
)))]
compile_error!("enable a solver backend: microlp, highs, coin_cbc or gurobi");

/// Builds and solves a lithium extraction plan
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Number of extraction processes
    #[clap(default_value_t = 5)]
    n_ex: usize,
    /// Number of technologies
    #[clap(default_value_t = 5)]
    n_tec: usize,
    /// Length of the horizon in months
    #[clap(default_value_t = 36)]
    t_mes: usize,
    /// Number of water plants
    #[clap(long, default_value_t = 1)]
    plants: usize,
    /// Number of transport methods
    #[clap(long, default_value_t = 1)]
    transports: usize,
    /// V1, V2 or V3
    #[clap(long, default_value = "V1")]
    variant: Variant,
    /// Seed of the parameter synthesis
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Enforce start precedence between processes (V2 and V3)
    #[clap(long)]
    precedence: bool,
    /// Write the synthesized parameters as JSON
    #[clap(long)]
    parameters: Option<PathBuf>,
    /// Write the variable values as JSON
    #[clap(long)]
    results: Option<PathBuf>,
    /// Solver time limit in seconds
    #[clap(long)]
    time_limit: Option<f64>,
    /// Print every variable, not only the nonzero ones
    #[clap(long)]
    print: bool,
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let sizes = Sizes::new(
        args.n_ex,
        args.n_tec,
        args.t_mes,
        args.plants,
        args.transports,
    );
    if args.precedence && !args.variant.has_water_network() {
        warn!("Start precedence is only available for V2 and V3, ignoring it");
    }

    let (parameters, built) = plan(&sizes, args.variant, args.seed, args.precedence)?;
    if let Some(path) = &args.parameters {
        write_json(&parameters, path)?;
    }

    let mut solver = solver(args);
    let solution = solver.solve(&built.model)?;
    report(args, &built, &solution)
}

#[cfg(feature = "gurobi")]
fn solver(args: &Args) -> impl Solver {
    lithium::solver::gurobi::GurobiSolver::new(args.time_limit, true)
}

#[cfg(not(feature = "gurobi"))]
fn solver(args: &Args) -> impl Solver {
    if args.time_limit.is_some() {
        warn!("--time-limit is only used by the gurobi backend");
    }
    lithium::solver::lp::LpSolver::new()
}

fn report(args: &Args, built: &Built, solution: &Solution) -> Result<()> {
    println!("Status: {}", solution.status);

    if solution.status != Status::Optimal {
        if !solution.iis.is_empty() {
            println!("Irreducible infeasible subsystem:");
            for name in &solution.iis {
                println!("    {}", name);
            }
        }
        return Ok(());
    }

    let values = solution.values()?;
    if let Some(objective) = solution.objective {
        println!("Objective: {}", objective);
    }
    println!("{:<24} {:>12}", "Variable", "X");
    for var in built.model.vars() {
        let value = values.get(&var.var).copied().unwrap_or_default();
        if args.print || value.abs() > 1e-6 {
            println!("{:<24} {:>12}", var.name, value);
        }
    }

    if let Some(path) = &args.results {
        write_json(&LithiumResults::new(built, solution)?, path)?;
    }
    Ok(())
}

pub fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
