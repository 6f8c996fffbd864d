//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim: pool sizing,
//! single-symbol evaluation, and the parallel 3j table sweep.

use anyhow::Result;
use rayon::prelude::*;
use tracing::info;

use super::{Cli, Commands};

/// Initialize the global pool for this invocation. The pool must cover the
/// largest doubled momentum reachable by the call, either given explicitly
/// or taken from the arguments themselves.
fn init_pool(cli: &Cli, js: &[i32], symbol_kind: i32) {
    let max_two_j = cli
        .max_two_j
        .unwrap_or_else(|| js.iter().copied().max().unwrap_or(0));
    racah::global_init(max_two_j, symbol_kind);
}

pub fn run(cli: &Cli) -> Result<()> {
    match cli.command {
        Commands::ThreeJ {
            two_j1,
            two_j2,
            two_j3,
            two_m1,
            two_m2,
            two_m3,
        } => {
            init_pool(cli, &[two_j1, two_j2, two_j3], 3);
            println!(
                "{:.17e}",
                racah::three_j(two_j1, two_j2, two_j3, two_m1, two_m2, two_m3)
            );
        }
        Commands::SixJ {
            two_j1,
            two_j2,
            two_j3,
            two_j4,
            two_j5,
            two_j6,
        } => {
            init_pool(cli, &[two_j1, two_j2, two_j3, two_j4, two_j5, two_j6], 6);
            println!(
                "{:.17e}",
                racah::six_j(two_j1, two_j2, two_j3, two_j4, two_j5, two_j6)
            );
        }
        Commands::NineJ {
            two_j1,
            two_j2,
            two_j3,
            two_j4,
            two_j5,
            two_j6,
            two_j7,
            two_j8,
            two_j9,
        } => {
            init_pool(
                cli,
                &[
                    two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, two_j7, two_j8, two_j9,
                ],
                9,
            );
            println!(
                "{:.17e}",
                racah::nine_j(
                    two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, two_j7, two_j8, two_j9
                )
            );
        }
        Commands::Cg {
            two_j1,
            two_j2,
            two_m1,
            two_m2,
            two_big_j,
            two_big_m,
        } => {
            init_pool(cli, &[two_j1, two_j2, two_big_j], 3);
            println!(
                "{:.17e}",
                racah::cg(two_j1, two_j2, two_m1, two_m2, two_big_j, two_big_m)
            );
        }
        Commands::Table {
            two_j1,
            two_j2,
            two_j3,
        } => {
            init_pool(cli, &[two_j1, two_j2, two_j3], 3);
            run_table(two_j1, two_j2, two_j3);
        }
    }
    Ok(())
}

/// Evaluate every `(m1, m2)` projection of a 3j triple in parallel. The
/// global pool is read-only and each Rayon worker owns its scratch, so the
/// sweep needs no synchronization beyond the join.
fn run_table(two_j1: i32, two_j2: i32, two_j3: i32) {
    let start = std::time::Instant::now();

    let mut projections = Vec::new();
    let mut two_m1 = -two_j1;
    while two_m1 <= two_j1 {
        let mut two_m2 = -two_j2;
        while two_m2 <= two_j2 {
            let two_m3 = -(two_m1 + two_m2);
            if two_m3.abs() <= two_j3 {
                projections.push((two_m1, two_m2, two_m3));
            }
            two_m2 += 2;
        }
        two_m1 += 2;
    }

    let lines: Vec<String> = projections
        .par_iter()
        .map(|&(two_m1, two_m2, two_m3)| {
            let value = racah::three_j(two_j1, two_j2, two_j3, two_m1, two_m2, two_m3);
            format!("{two_m1:>6} {two_m2:>6} {two_m3:>6}  {value:.17e}")
        })
        .collect();

    println!("# 2j1={two_j1} 2j2={two_j2} 2j3={two_j3}");
    println!("#  2m1    2m2    2m3  value");
    for line in &lines {
        println!("{line}");
    }

    info!(
        entries = lines.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "table sweep complete"
    );
}
