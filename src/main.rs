use anyhow::{bail, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::process;

use minplus::graph::{fletcher16, gen_graph, read_matrix, write_matrix, DEFAULT_SEED};
use minplus::types::{Config, Deployment, KernelKind};

const DEFAULT_NODES: usize = 200;

#[derive(Parser, Debug)]
#[clap(
    name = "minplus",
    version,
    about = "All-pairs shortest paths on a random graph by repeated min-plus relaxation."
)]
struct Args {
    /// Number of nodes [default: 200]
    #[clap(short = 'n')]
    nodes: Option<usize>,

    /// Edge probability
    #[clap(short = 'p', default_value_t = 0.05)]
    probability: f64,

    /// Write the adjacency matrix to this file
    #[clap(short = 'i')]
    input_dump: Option<PathBuf>,

    /// Write the distance matrix to this file
    #[clap(short = 'o')]
    output: Option<PathBuf>,

    /// Read the adjacency matrix from this file instead of generating one
    #[clap(short = 'f')]
    file: Option<PathBuf>,

    /// Number of workers [default: available parallelism, at most the number of nodes]
    #[clap(short = 'w', long)]
    workers: Option<usize>,

    /// Use the shared-memory deployment instead of distributed workers
    #[clap(long, conflicts_with = "workers")]
    shared: bool,

    /// Relaxation kernel: auto, portable, or avx2
    #[clap(long)]
    kernel: Option<KernelKind>,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env();

    let adjacency = match &args.file {
        Some(path) => {
            let m = read_matrix(path)?;
            if let Some(n) = args.nodes {
                if n != m.size() {
                    bail!("{:?} holds {} nodes but -n {} was given", path, m.size(), n);
                }
            }
            m
        }
        None => {
            let n = args.nodes.unwrap_or(DEFAULT_NODES);
            if !(0.0..=1.0).contains(&args.probability) {
                bail!("edge probability {} is not within [0, 1]", args.probability);
            }
            gen_graph(n, args.probability, DEFAULT_SEED)
        }
    };

    let n = adjacency.size();

    if let Some(path) = &args.input_dump {
        write_matrix(path, &adjacency)?;
    }

    if args.shared {
        config.driver.deployment = Deployment::SharedMemory;
    } else if let Some(workers) = args.workers {
        config.driver.deployment = Deployment::Distributed { workers };
    } else if let Deployment::Distributed { workers } = config.driver.deployment {
        let workers = workers.min(n).max(1);
        config.driver.deployment = Deployment::Distributed { workers };
    }

    if let Some(kernel) = args.kernel {
        config.worker.kernel = kernel;
    }

    let solution = minplus::solve(&config, &adjacency)?;
    let check = fletcher16(solution.distances.as_slice());

    if args.json {
        let report = json!({
            "n": n,
            "p": args.probability,
            "check": format!("{:X}", check),
            "solution": solution,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("== {}", solution.deployment);
        println!("n:     {}", n);
        println!("p:     {}", args.probability);
        println!("Time:  {}", solution.elapsed.as_secs_f64());
        println!("Sweeps: {}", solution.sweeps);
        println!("Check: {:X}", check);
    }

    if let Some(path) = &args.output {
        write_matrix(path, &solution.distances)?;
    }

    Ok(())
}

fn main() {
    minplus::initialize_logger();

    if let Err(e) = run(Args::parse()) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
