//! Per-thread scratch for symbol evaluation.
//!
//! Holds the exponent-vector bank (fixed-role slots plus one slot per Racah
//! sum iteration), the `BigInt` workspaces, and the prime-product evaluator
//! state. Built lazily on a thread's first evaluation from the published
//! pool's geometry, torn down on thread exit, and resettable through
//! [`reset_tls`]. No thread ever touches another thread's scratch, which is
//! the whole concurrency story: immutable pool, private scratch, no locks.

use std::cell::RefCell;

use tracing::debug;

use crate::big_int::BigInt;
use crate::expvec::ExpArena;
use crate::pool::{pool, GlobalPool};
use crate::product::ProductEval;

/// Fixed-role slots in the exponent-vector bank.
pub(crate) const PREFACT: usize = 0;
pub(crate) const MIN_NUME: usize = 1;
pub(crate) const NUME_TRIPROD: usize = 2;
pub(crate) const TRIPROD_FX: usize = 3; // three consecutive slots
/// First of the per-iteration slots.
pub(crate) const ITER_START: usize = 6;

pub(crate) struct Scratch {
    pub bank: ExpArena,
    pub max_iter: usize,
    num_primes: usize,

    pub sum_prod: BigInt,
    pub big_prod: BigInt,
    pub big_sqrt: BigInt,
    pub big_nume: BigInt,
    pub big_div: BigInt,
    pub big_nume_prod: BigInt,
    pub triprod: BigInt,
    pub triprod_tmp: BigInt,
    pub triprod_factor: BigInt,

    pub eval: ProductEval,
}

impl Scratch {
    fn for_pool(pool: &GlobalPool) -> Scratch {
        let max_iter = (pool.max_two_j / 2 + 1).max(1) as usize;
        let num_primes = pool.table.num_primes();
        debug!(max_iter, num_primes, "creating per-thread scratch");
        Scratch {
            bank: ExpArena::new(ITER_START + max_iter, num_primes),
            max_iter,
            num_primes,
            sum_prod: BigInt::new(),
            big_prod: BigInt::new(),
            big_sqrt: BigInt::new(),
            big_nume: BigInt::new(),
            big_div: BigInt::new(),
            big_nume_prod: BigInt::new(),
            triprod: BigInt::new(),
            triprod_tmp: BigInt::new(),
            triprod_factor: BigInt::new(),
            eval: ProductEval::default(),
        }
    }

    /// Grow the iteration bank when a call needs more slots than the scratch
    /// was sized for. Existing fixed-role slots are preserved.
    pub fn ensure_iter_capacity(&mut self, needed: usize) {
        if needed <= self.max_iter {
            return;
        }
        debug!(
            old = self.max_iter,
            new = needed,
            "rebuilding scratch iteration bank"
        );
        let mut bank = ExpArena::new(ITER_START + needed, self.num_primes);
        bank.copy_records_from(&self.bank);
        self.bank = bank;
        self.max_iter = needed;
    }

    pub fn reset(&mut self) {
        self.bank.zero_all();
        for big in [
            &mut self.sum_prod,
            &mut self.big_prod,
            &mut self.big_sqrt,
            &mut self.big_nume,
            &mut self.big_div,
            &mut self.big_nume_prod,
            &mut self.triprod,
            &mut self.triprod_tmp,
            &mut self.triprod_factor,
        ] {
            big.set_word(0);
        }
        self.eval.reset();
    }
}

thread_local! {
    static SCRATCH: RefCell<Option<Scratch>> = const { RefCell::new(None) };
}

/// Run `f` with the published pool and this thread's scratch, creating the
/// scratch on first use.
pub(crate) fn with_scratch<R>(f: impl FnOnce(&GlobalPool, &mut Scratch) -> R) -> R {
    let pool = pool();
    SCRATCH.with(|cell| {
        let mut slot = cell.borrow_mut();
        let scratch = slot.get_or_insert_with(|| Scratch::for_pool(pool));
        f(pool, scratch)
    })
}

/// Clear the calling thread's scratch: zero the exponent bank and every
/// `BigInt` workspace. A no-op on threads that never evaluated anything.
pub fn reset_tls() {
    SCRATCH.with(|cell| {
        if let Some(scratch) = cell.borrow_mut().as_mut() {
            scratch.reset();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::GlobalPool;

    #[test]
    fn iteration_bank_rebuild_preserves_fixed_slots() {
        let pool = GlobalPool::new(2 * 5, 3);
        let mut scratch = Scratch::for_pool(&pool);
        let before = scratch.max_iter;
        {
            let mut prefact = scratch.bank.rec_mut(PREFACT);
            prefact.set_zero(2);
            prefact.set(1, 17);
        }
        scratch.ensure_iter_capacity(before + 10);
        assert_eq!(scratch.max_iter, before + 10);
        assert_eq!(scratch.bank.rec(PREFACT).z(1), 17);
        assert_eq!(scratch.bank.records(), ITER_START + before + 10);
    }

    #[test]
    fn reset_zeroes_bank_and_workspaces() {
        let pool = GlobalPool::new(2 * 5, 3);
        let mut scratch = Scratch::for_pool(&pool);
        scratch.sum_prod.set_u64(0xdead_beef_cafe);
        scratch.bank.rec_mut(MIN_NUME).set_max(3);
        scratch.reset();
        assert_eq!(scratch.sum_prod, BigInt::from_word(0));
        assert_eq!(scratch.bank.rec(MIN_NUME).used(), 0);
    }
}
