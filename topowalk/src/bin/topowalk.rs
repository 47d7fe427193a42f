//! Discover a switch network from a seed address.
//!
//! # Usage
//!
//! ```bash
//! topowalk --seed 192.168.1.31 --credentials credentials.yaml --output-dir output
//! ```
//!
//! Writes `topology.json` and `inventory.yaml` into the output directory.
//! Ctrl-C stops probing new switches and writes what was found so far.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use topowalk::{CredentialTable, Discovery, Inventory, SshConnector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(seed) = args.seed else {
        eprintln!("Error: --seed is required");
        Args::print_help();
        std::process::exit(1);
    };

    let credentials = CredentialTable::load(&args.credentials)?;

    let mut builder = Discovery::builder(SshConnector::new(), credentials)
        .workers(args.workers)
        .max_depth(args.max_depth);
    if let Some(secs) = args.deadline {
        builder = builder.deadline(Duration::from_secs(secs));
    }
    let discovery = builder.build();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing in-flight probes...");
            on_interrupt.cancel();
        }
    });

    println!("Discovering from {} (max depth {})...", seed, args.max_depth);
    let graph = discovery.run_with_cancel(&seed, cancel).await?;

    fs::create_dir_all(&args.output_dir)?;
    let topology_path = args.output_dir.join("topology.json");
    fs::write(&topology_path, serde_json::to_string_pretty(&graph)?)?;

    let inventory = Inventory::from_graph(&graph);
    let inventory_path = args.output_dir.join("inventory.yaml");
    fs::write(&inventory_path, inventory.to_yaml()?)?;

    println!("{}", "-".repeat(50));
    println!("Switches discovered: {}", inventory.total_switches_discovered);
    println!("Unreachable:         {}", inventory.unreachable.len());
    println!("Links:               {}", graph.edge_count());
    if graph.cancelled {
        println!("Discovery was cancelled before the network was fully explored.");
    }
    for host in &inventory.unreachable {
        println!("  {} - {}", host.address, host.reason);
    }
    println!("{}", "-".repeat(50));
    println!("Topology:  {}", topology_path.display());
    println!("Inventory: {}", inventory_path.display());

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    seed: Option<String>,
    credentials: PathBuf,
    output_dir: PathBuf,
    max_depth: usize,
    workers: usize,
    deadline: Option<u64>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut seed = None;
        let mut credentials = PathBuf::from("credentials.yaml");
        let mut output_dir = PathBuf::from("output");
        let mut max_depth = 5usize;
        let mut workers = 8usize;
        let mut deadline = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        seed = Some(args[i].clone());
                    }
                }
                "--credentials" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        credentials = PathBuf::from(&args[i]);
                    }
                }
                "--output-dir" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output_dir = PathBuf::from(&args[i]);
                    }
                }
                "--max-depth" | "-d" => {
                    i += 1;
                    if i < args.len() {
                        max_depth = args[i].parse().unwrap_or(5);
                    }
                }
                "--workers" | "-w" => {
                    i += 1;
                    if i < args.len() {
                        workers = args[i].parse().unwrap_or(8);
                    }
                }
                "--deadline" => {
                    i += 1;
                    if i < args.len() {
                        deadline = args[i].parse().ok();
                    }
                }
                "--help" | "-h" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            seed,
            credentials,
            output_dir,
            max_depth,
            workers,
            deadline,
        }
    }

    fn print_help() {
        println!(
            r#"topowalk - switch topology discovery

USAGE:
    topowalk --seed <IP> [OPTIONS]

OPTIONS:
    -s, --seed <IP>            Address of the first switch
    -c, --credentials <PATH>   Credential table [default: credentials.yaml]
    -o, --output-dir <DIR>     Where to write results [default: output]
    -d, --max-depth <N>        Hops from the seed to explore [default: 5]
    -w, --workers <N>          Switches probed concurrently [default: 8]
        --deadline <SECS>      Stop probing new switches after this long
    -h, --help                 Print this help message

ENVIRONMENT:
    RUST_LOG                   Log filter [default: info]
"#
        );
    }
}
