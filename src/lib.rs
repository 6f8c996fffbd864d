//! # Racah — Exact Wigner Symbol Evaluation
//!
//! Computes Wigner 3j, 6j, 9j symbols and Clebsch–Gordan coefficients at
//! full double precision for angular momenta as large as j ≈ 1000. The
//! factorials inside the Racah formulas overflow any native float long
//! before that, so nothing here is evaluated in floating point until the
//! very last step: every term lives as a vector of prime exponents, sums are
//! accumulated in exact multi-word integers, and one final division plus a
//! pending square root produce the `f64` result.
//!
//! ## Module Organization
//!
//! **Arithmetic core**:
//! - [`big_int`] — signed two's-complement multi-word integers.
//! - [`expvec`] — prime-exponent vectors and their in-place algebra.
//! - [`product`] — exponent vector → `BigInt` via ping-pong accumulation.
//!
//! **Precomputation and state**:
//! - [`pool`] — prime sieve, number pool, factorial pool; built once per
//!   process and immutable afterwards.
//! - [`scratch`] — per-thread workspaces reused across evaluations.
//!
//! **Evaluation**:
//! - `calc` — selection rules, Racah sums, Δ-coefficients, the √-split
//!   and the final `ldexp` reconstruction.
//! - [`error`] — the finite fatal-error taxonomy and its replaceable sink.
//!
//! ## Encoding
//!
//! All quantum numbers are passed **doubled** (`two_j = 2j`, `two_m = 2m`)
//! so half-integer momenta stay integral: `j = 3/2` is `two_j = 3`.
//!
//! ## Usage
//!
//! ```no_run
//! racah::global_init(2 * 100, 9);
//! let w3 = racah::three_j(2, 4, 6, 0, 0, 0);
//! let w6 = racah::six_j(4, 4, 4, 4, 4, 4);
//! let w9 = racah::nine_j(4, 4, 4, 4, 4, 4, 4, 4, 4);
//! let c = racah::cg(8, 6, -2, -4, 10, -6);
//! ```
//!
//! ## Concurrency
//!
//! `global_init` publishes an immutable pool once per process
//! (first-write-wins); evaluations run synchronously on the calling thread
//! against thread-local scratch. No locks are held during evaluation, and
//! identical inputs yield bitwise-identical results on every thread.

mod calc;

pub mod big_int;
pub mod error;
pub mod expvec;
pub mod pool;
pub mod product;
pub mod scratch;

pub use error::{set_fatal_handler, Fatal, FatalHandler};
pub use pool::global_init;
pub use scratch::reset_tls;

/// Wigner 3j symbol of the doubled arguments; exactly `0.0` when any
/// selection rule fails.
pub fn three_j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_m1: i32,
    two_m2: i32,
    two_m3: i32,
) -> f64 {
    calc::calc_3j(two_j1, two_j2, two_j3, two_m1, two_m2, two_m3)
}

/// Wigner 6j symbol of the doubled arguments.
pub fn six_j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
) -> f64 {
    calc::calc_6j(two_j1, two_j2, two_j3, two_j4, two_j5, two_j6)
}

/// Wigner 9j symbol of the doubled arguments.
#[allow(clippy::too_many_arguments)]
pub fn nine_j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
    two_j7: i32,
    two_j8: i32,
    two_j9: i32,
) -> f64 {
    calc::calc_9j(
        two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, two_j7, two_j8, two_j9,
    )
}

/// Clebsch–Gordan coefficient `<j1 m1 j2 m2 | J M>` of the doubled
/// arguments.
pub fn cg(
    two_j1: i32,
    two_j2: i32,
    two_m1: i32,
    two_m2: i32,
    two_big_j: i32,
    two_big_m: i32,
) -> f64 {
    calc::calc_cg(two_j1, two_j2, two_m1, two_m2, two_big_j, two_big_m)
}
