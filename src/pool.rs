//! Prime table and the global factorial pool.
//!
//! One-time precomputation keyed on the largest factorial any evaluation can
//! request: the sieve of primes up to `N`, the prime factorization of every
//! integer `0..=N` (the number pool), and the factorization of `n!` for every
//! `0 <= n <= N` (the factorial pool). Published process-wide exactly once;
//! read-only and lock-free afterwards, which is what makes evaluation safe to
//! run on any number of threads against per-thread scratch.

use std::sync::OnceLock;

use tracing::info;

use crate::error::{fatal, Fatal};
use crate::expvec::{Exp, ExpArena, ExpRef, MAX_EXP};

/// Ascending primes up to the pool's factorial capacity.
pub struct PrimeTable {
    pub max_factorial: usize,
    pub primes: Vec<u32>,
}

impl PrimeTable {
    fn new(max_factorial: usize) -> PrimeTable {
        let mut is_prime = vec![true; max_factorial + 1];
        let mut i = 2usize;
        while i * i <= max_factorial {
            if is_prime[i] {
                let mut j = i * i;
                while j <= max_factorial {
                    is_prime[j] = false;
                    j += i;
                }
            }
            i += 1;
        }
        let primes: Vec<u32> = (2..=max_factorial)
            .filter(|&n| is_prime[n])
            .map(|n| n as u32)
            .collect();
        PrimeTable {
            max_factorial,
            primes,
        }
    }

    pub fn num_primes(&self) -> usize {
        self.primes.len()
    }
}

/// The immutable global pool: prime table, number pool, factorial pool.
pub struct GlobalPool {
    pub max_two_j: i32,
    pub symbol_kind: i32,
    pub table: PrimeTable,
    num_pool: ExpArena,
    factorial_pool: ExpArena,
}

/// Largest factorial reachable for `(max_two_j, symbol_kind)`, clamped to
/// at least 2 so the smallest pools stay well formed.
pub(crate) fn derived_max_factorial(max_two_j: i32, symbol_kind: i32) -> usize {
    let n = (symbol_kind as i64 / 3 + 2) * (max_two_j as i64 / 2) + 1;
    n.max(2) as usize
}

impl GlobalPool {
    pub(crate) fn new(max_two_j: i32, symbol_kind: i32) -> GlobalPool {
        let max_factorial = derived_max_factorial(max_two_j, symbol_kind);
        let table = PrimeTable::new(max_factorial);
        let np = table.num_primes();
        let mut num_pool = ExpArena::new(max_factorial + 1, np);
        let mut factorial_pool = ExpArena::new(max_factorial + 1, np);

        fill_num_pool(&mut num_pool, &table);
        fill_factorial_pool(&mut factorial_pool, &num_pool, max_factorial);

        GlobalPool {
            max_two_j,
            symbol_kind,
            table,
            num_pool,
            factorial_pool,
        }
    }

    /// Prime-exponent factorization of `n!`.
    #[inline]
    pub fn factorial(&self, n: usize) -> ExpRef<'_> {
        self.factorial_pool.rec(n)
    }

    /// Prime-exponent factorization of the integer `n`.
    #[inline]
    pub fn number(&self, n: usize) -> ExpRef<'_> {
        self.num_pool.rec(n)
    }
}

/// Fill the number pool by enumerating every integer in `1..=N` exactly once
/// with a mixed-radix odometer over the primes: multiply by the smallest
/// prime that keeps the running value in range, otherwise roll that prime's
/// exponent back to zero and advance to the next prime.
fn fill_num_pool(num_pool: &mut ExpArena, table: &PrimeTable) {
    let primes = &table.primes;
    let np = primes.len();
    let limit = table.max_factorial as u64;

    let mut stage: Vec<Exp> = vec![0; np];
    let mut cur: u64 = 1;
    let mut max_p = 0usize;

    'enumerate: loop {
        let mut p = 0usize;
        loop {
            if cur * primes[p] as u64 <= limit {
                stage[p] += 1;
                cur *= primes[p] as u64;
                break;
            }
            while stage[p] > 0 {
                cur /= primes[p] as u64;
                stage[p] = 0;
            }
            p += 1;
            if p > max_p {
                max_p = p;
            }
            if p >= np {
                break 'enumerate;
            }
        }
        let used = max_p + 1;
        let mut rec = num_pool.rec_mut(cur as usize);
        rec.set_zero(used);
        for i in 0..used {
            rec.set(i, stage[i]);
        }
    }
}

/// Cumulative sums: `n! = (n-1)! * n` in exponent space, with the active
/// width the maximum of the two contributors.
fn fill_factorial_pool(factorial_pool: &mut ExpArena, num_pool: &ExpArena, max_factorial: usize) {
    for n in 1..=max_factorial {
        let num = num_pool.rec(n);
        let (mut dst, prev) = factorial_pool.rec_pair_mut(n, n - 1);
        let used = prev.used().max(num.used());
        dst.set_zero(used);
        for p in 0..used {
            dst.set(p, prev.z(p) + num.z(p));
        }
    }
}

static POOL: OnceLock<GlobalPool> = OnceLock::new();

/// Initialize or validate the process-wide pool. Idempotent: the first
/// successful call wins and later calls are no-ops. Fatal on a symbol kind
/// outside {3, 6, 9} or a factorial range past the exponent bound.
pub fn global_init(max_two_j: i32, symbol_kind: i32) {
    if !matches!(symbol_kind, 3 | 6 | 9) {
        fatal(Fatal::BadSymbolKind);
    }
    let max_factorial = derived_max_factorial(max_two_j, symbol_kind);
    if max_factorial as u64 * 50 > MAX_EXP as u64 {
        fatal(Fatal::FactorialTooLarge);
    }
    let mut built = false;
    let pool = POOL.get_or_init(|| {
        built = true;
        GlobalPool::new(max_two_j, symbol_kind)
    });
    if built {
        info!(
            max_two_j,
            symbol_kind,
            max_factorial = pool.table.max_factorial,
            num_primes = pool.table.num_primes(),
            "factorial pool initialized"
        );
    }
}

/// The published pool; fatal if no `global_init` has succeeded yet.
pub(crate) fn pool() -> &'static GlobalPool {
    match POOL.get() {
        Some(pool) => pool,
        None => fatal(Fatal::NotInitialized),
    }
}
