//! # Main — CLI Entry Point
//!
//! Thin argument layer over the evaluation library. Each symbol kind has a
//! subcommand taking doubled quantum numbers; `table` sweeps every
//! non-trivial projection pair of a 3j triple across the Rayon thread pool.
//!
//! Pool sizing comes from `--max-two-j` when given, otherwise from the
//! largest doubled momentum in the arguments. Logging goes through
//! `tracing` and is controlled with `RUST_LOG`.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "racah",
    about = "Exact Wigner 3j/6j/9j symbols and Clebsch-Gordan coefficients"
)]
struct Cli {
    /// Largest doubled angular momentum the pool must support
    /// (defaults to the largest argument of the requested symbol)
    #[arg(long)]
    max_two_j: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wigner 3j symbol of doubled arguments: 2j1 2j2 2j3 2m1 2m2 2m3
    #[command(name = "3j", allow_negative_numbers = true)]
    ThreeJ {
        two_j1: i32,
        two_j2: i32,
        two_j3: i32,
        two_m1: i32,
        two_m2: i32,
        two_m3: i32,
    },
    /// Wigner 6j symbol of doubled arguments: 2j1 .. 2j6
    #[command(name = "6j", allow_negative_numbers = true)]
    SixJ {
        two_j1: i32,
        two_j2: i32,
        two_j3: i32,
        two_j4: i32,
        two_j5: i32,
        two_j6: i32,
    },
    /// Wigner 9j symbol of doubled arguments: 2j1 .. 2j9
    #[command(name = "9j", allow_negative_numbers = true)]
    NineJ {
        two_j1: i32,
        two_j2: i32,
        two_j3: i32,
        two_j4: i32,
        two_j5: i32,
        two_j6: i32,
        two_j7: i32,
        two_j8: i32,
        two_j9: i32,
    },
    /// Clebsch-Gordan coefficient <j1 m1 j2 m2 | J M>: 2j1 2j2 2m1 2m2 2J 2M
    #[command(allow_negative_numbers = true)]
    Cg {
        two_j1: i32,
        two_j2: i32,
        two_m1: i32,
        two_m2: i32,
        two_big_j: i32,
        two_big_m: i32,
    },
    /// Every non-trivial 3j projection pair for a fixed (j1, j2, j3) triple
    Table {
        #[arg(long)]
        two_j1: i32,
        #[arg(long)]
        two_j2: i32,
        #[arg(long)]
        two_j3: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(&cli)
}
