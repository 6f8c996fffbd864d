//! Assembling a [`BigInt`] from a prime-exponent vector.
//!
//! Each prime power `p^e` is built by square-and-multiply on a 64-bit
//! machine word for as long as the partial power fits; once the next square
//! would reach the word's top half, the power continues in `BigInt`
//! arithmetic. Finished factors are merged into a two-slot ping-pong
//! accumulator: single-word factors multiply the active slot in place,
//! multi-word factors write the full product into the inactive slot and the
//! buffers flip.

use crate::big_int::BigInt;
use crate::expvec::ExpRef;

const MULW_BITS: u32 = 64;
/// Any bit here set means the next machine-word square could overflow.
const MULW_HALF_MASK: u64 = !0u64 << (MULW_BITS / 2 - 1);

/// Ping-pong evaluator state, part of the per-thread scratch.
#[derive(Default)]
pub struct ProductEval {
    prod_pos: [BigInt; 2],
    prod_neg: [BigInt; 2],
    factor: [BigInt; 2],
    big_up: [BigInt; 2],
}

impl ProductEval {
    pub fn reset(&mut self) {
        for slot in self
            .prod_pos
            .iter_mut()
            .chain(self.prod_neg.iter_mut())
            .chain(self.factor.iter_mut())
            .chain(self.big_up.iter_mut())
        {
            slot.set_word(0);
        }
    }

    /// Compute `prime^e` into `self.factor`, returning the active slot.
    fn compute_prime_factor(&mut self, prime: u64, mut e: u32) -> usize {
        debug_assert!(e > 0);
        let mut fact: u64 = 1;
        let mut up: u64 = prime;
        loop {
            if e & 1 == 1 {
                fact *= up;
            }
            up *= up;
            e >>= 1;
            if e == 0 {
                self.factor[0].set_u64(fact);
                return 0;
            }
            if up & MULW_HALF_MASK != 0 {
                break;
            }
        }

        // The partial power outgrew the machine word.
        let mut up_active = 0usize;
        let mut fact_active = 0usize;
        self.big_up[0].set_u64(up);
        self.factor[0].set_u64(fact);
        loop {
            if e & 1 == 1 {
                let merged = &self.factor[fact_active] * &self.big_up[up_active];
                self.factor[1 - fact_active] = merged;
                fact_active = 1 - fact_active;
            }
            e >>= 1;
            if e == 0 {
                return fact_active;
            }
            let squared = &self.big_up[up_active] * &self.big_up[up_active];
            self.big_up[1 - up_active] = squared;
            up_active = 1 - up_active;
        }
    }

    /// Fold a finished factor into a ping-pong accumulator pair.
    fn merge_factor(prod: &mut [BigInt; 2], factor: &BigInt, active: usize) -> usize {
        if factor.is_single_word() {
            prod[active] *= factor[0];
            active
        } else {
            let next = 1 - active;
            let merged = &prod[active] * factor;
            prod[next] = merged;
            next
        }
    }

    /// Product of `primes[i]^input[i]` over the live prefix; all exponents
    /// must be non-negative. The result is swapped into `out`.
    pub fn evaluate(&mut self, primes: &[u32], input: ExpRef<'_>, out: &mut BigInt) {
        let mut active = 0usize;
        self.prod_pos[active].set_word(1);
        for i in 0..input.used() {
            let e = input.z(i);
            if e == 0 {
                continue;
            }
            debug_assert!(e > 0, "evaluate wants a min-normalized vector");
            let fa = self.compute_prime_factor(primes[i] as u64, e as u32);
            let Self {
                prod_pos, factor, ..
            } = self;
            active = Self::merge_factor(prod_pos, &factor[fa], active);
        }
        std::mem::swap(&mut self.prod_pos[active], out);
    }

    /// Split evaluation of a mixed-sign vector: positive exponents assemble
    /// into `out_pos`, negated negative exponents into `out_neg`.
    pub fn evaluate2(
        &mut self,
        primes: &[u32],
        input: ExpRef<'_>,
        out_pos: &mut BigInt,
        out_neg: &mut BigInt,
    ) {
        let mut active_pos = 0usize;
        let mut active_neg = 0usize;
        self.prod_pos[active_pos].set_word(1);
        self.prod_neg[active_neg].set_word(1);
        for i in 0..input.used() {
            let e = input.z(i);
            if e == 0 {
                continue;
            }
            if e > 0 {
                let fa = self.compute_prime_factor(primes[i] as u64, e as u32);
                let Self {
                    prod_pos, factor, ..
                } = self;
                active_pos = Self::merge_factor(prod_pos, &factor[fa], active_pos);
            } else {
                let fa = self.compute_prime_factor(primes[i] as u64, e.unsigned_abs());
                let Self {
                    prod_neg, factor, ..
                } = self;
                active_neg = Self::merge_factor(prod_neg, &factor[fa], active_neg);
            }
        }
        std::mem::swap(&mut self.prod_pos[active_pos], out_pos);
        std::mem::swap(&mut self.prod_neg[active_neg], out_neg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expvec::{Exp, ExpArena};

    const PRIMES: [u32; 4] = [2, 3, 5, 7];

    fn vector(exps: &[Exp]) -> ExpArena {
        let mut arena = ExpArena::new(1, PRIMES.len());
        let mut rec = arena.rec_mut(0);
        rec.set_zero(exps.len());
        for (i, &e) in exps.iter().enumerate() {
            rec.set(i, e);
        }
        arena
    }

    #[test]
    fn small_products_stay_single_word() {
        let arena = vector(&[3, 2, 0, 1]);
        let mut eval = ProductEval::default();
        let mut out = BigInt::new();
        eval.evaluate(&PRIMES, arena.rec(0), &mut out);
        assert_eq!(out, BigInt::from_word(8 * 9 * 7)); // 504
    }

    #[test]
    fn empty_vector_evaluates_to_one() {
        let arena = vector(&[]);
        let mut eval = ProductEval::default();
        let mut out = BigInt::new();
        eval.evaluate(&PRIMES, arena.rec(0), &mut out);
        assert_eq!(out, BigInt::from_word(1));
    }

    #[test]
    fn large_power_switches_to_big_arithmetic() {
        let arena = vector(&[100]);
        let mut eval = ProductEval::default();
        let mut out = BigInt::new();
        eval.evaluate(&PRIMES, arena.rec(0), &mut out);
        // 2^100 in hex: 1 followed by 25 zeros.
        assert_eq!(out.to_hex_string(), format!("1{}", "0".repeat(25)));
    }

    #[test]
    fn odd_large_exponent_consistent_with_squaring() {
        let mut eval = ProductEval::default();

        let arena = vector(&[0, 25]);
        let mut p25 = BigInt::new();
        eval.evaluate(&PRIMES, arena.rec(0), &mut p25);

        let arena = vector(&[0, 51]);
        let mut p51 = BigInt::new();
        eval.evaluate(&PRIMES, arena.rec(0), &mut p51);

        // 3^51 = (3^25)^2 * 3
        let mut expected = &p25 * &p25;
        expected *= 3u32;
        assert_eq!(p51, expected);
    }

    #[test]
    fn split_evaluation_separates_signs() {
        let arena = vector(&[2, -3, 1, -1]);
        let mut eval = ProductEval::default();
        let mut pos = BigInt::new();
        let mut neg = BigInt::new();
        eval.evaluate2(&PRIMES, arena.rec(0), &mut pos, &mut neg);
        assert_eq!(pos, BigInt::from_word(4 * 5));
        assert_eq!(neg, BigInt::from_word(27 * 7));
    }

    #[test]
    fn evaluator_state_is_reusable_across_calls() {
        let mut eval = ProductEval::default();
        let mut out = BigInt::new();
        for _ in 0..3 {
            let arena = vector(&[5, 0, 2]);
            eval.evaluate(&PRIMES, arena.rec(0), &mut out);
            assert_eq!(out, BigInt::from_word(32 * 25));
        }
    }
}
