//! join_bench - run record joins over synthetic parent/child workloads
//!
//! Usage:
//!   join_bench --operation one-to-many --held 100000 --incoming 400000
//!   RECORD_JOIN_WORKERS=4 join_bench --operation strict-one-to-one --held 250000

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use record_join::workload::{held_key, incoming_key, Workload};
use record_join::{JoinConfig, JoinKey, JoinOperation, RecordJoiner, SetKey};

#[derive(Parser)]
#[command(name = "join_bench")]
#[command(about = "Time record joins over synthetic workloads")]
struct Cli {
    /// Join to run
    #[arg(long, value_enum, default_value = "many-to-one")]
    operation: Operation,
    /// Number of held (parent) records
    #[arg(long, default_value_t = 100_000)]
    held: usize,
    /// Number of incoming (child) records; ignored for strict-one-to-one
    #[arg(long, default_value_t = 400_000)]
    incoming: usize,
    /// Dedicated merge workers (0 = one per CPU); overrides RECORD_JOIN_WORKERS
    #[arg(long)]
    workers: Option<usize>,
    /// Matched pairs needed before merging goes parallel; overrides
    /// RECORD_JOIN_PARALLEL_THRESHOLD
    #[arg(long)]
    threshold: Option<usize>,
    /// Timed repetitions
    #[arg(long, default_value_t = 5)]
    iterations: usize,
    /// Workload RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Operation {
    ManyToOne,
    StrictManyToOne,
    OneToMany,
    StrictOneToMany,
    StrictOneToOne,
}

impl From<Operation> for JoinOperation {
    fn from(op: Operation) -> Self {
        match op {
            Operation::ManyToOne => JoinOperation::ManyToOne,
            Operation::StrictManyToOne => JoinOperation::StrictManyToOne,
            Operation::OneToMany => JoinOperation::OneToMany,
            Operation::StrictOneToMany => JoinOperation::StrictOneToMany,
            Operation::StrictOneToOne => JoinOperation::StrictOneToOne,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let operation = JoinOperation::from(cli.operation);

    let mut config = JoinConfig::from_env()?;
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(threshold) = cli.threshold {
        config = config.with_parallel_threshold(threshold);
    }

    let workload = match cli.operation {
        Operation::StrictOneToOne => Workload::one_to_one(cli.held, cli.seed),
        _ => Workload::parents_and_children(cli.held, cli.incoming, cli.seed),
    };

    println!("\n{}", "═".repeat(70));
    println!("RECORD JOIN BENCHMARK: {}", operation);
    println!("{}", "═".repeat(70));
    println!("Held records: {}", workload.held.len());
    println!("Incoming records: {}", workload.incoming.len());
    match config.num_workers {
        Some(workers) => println!("Workers: {} (dedicated pool)", workers),
        None => println!("Workers: rayon global pool"),
    }
    println!("Parallel threshold: {}", config.parallel_threshold);

    let index_start = Instant::now();
    let held = held_key()
        .index(workload.held)
        .context("Failed to index held records")?;
    println!("Indexed {} held records in {:?}", held.len(), index_start.elapsed());

    let joiner = RecordJoiner::with_config(held, incoming_key(), config)?;
    let children: SetKey<record_join::Record> = SetKey::new("children");

    let mut timings = Vec::with_capacity(cli.iterations);
    let mut produced = 0;
    for iteration in 0..cli.iterations {
        let start = Instant::now();
        let out = match cli.operation {
            Operation::ManyToOne => joiner.many_to_one(&workload.incoming),
            Operation::StrictManyToOne => joiner.strict_many_to_one(&workload.incoming),
            Operation::OneToMany => joiner.one_to_many(&workload.incoming, &children),
            Operation::StrictOneToMany => {
                joiner.strict_one_to_many(&workload.incoming, &children)
            }
            Operation::StrictOneToOne => joiner.strict_one_to_one(&workload.incoming),
        }
        .with_context(|| format!("{} failed", operation))?;
        let elapsed = start.elapsed();
        produced = out.len();
        info!(iteration, records = produced, ?elapsed, "join iteration finished");
        timings.push(elapsed);
    }

    println!("\n{}", "─".repeat(70));
    println!("Output records: {}", produced);
    if let (Some(min), Some(max)) = (timings.iter().min(), timings.iter().max()) {
        let mean = timings.iter().sum::<std::time::Duration>() / timings.len() as u32;
        println!("Iterations: {}", timings.len());
        println!("Min: {:?}  Mean: {:?}  Max: {:?}", min, mean, max);
        let secs = mean.as_secs_f64();
        if secs > 0.0 {
            println!("Throughput: {:.0} records/s", produced as f64 / secs);
        }
    }
    println!("{}", "═".repeat(70));

    Ok(())
}
