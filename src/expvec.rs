//! Prime-exponent vectors and the in-place algebra on them.
//!
//! A positive rational is represented as a vector of signed 32-bit exponents
//! over the ascending list of primes. Vectors live in an [`ExpArena`]: one
//! flat allocation of fixed-size records, each record a 4-byte active-length
//! header followed by the exponent block, padded so every record spans whole
//! 64-byte cache lines. Positions at or past the active length (`used`) are
//! implicitly zero; every operation reads its sources through that rule, so
//! stale storage beyond a record's live prefix can never leak into a result.
//!
//! The operations mirror the shapes the symbol evaluator needs: sentinel
//! fill + min-reduction for the common-denominator normalization, fused
//! multi-term sums for the per-iteration factorial aggregates, and the
//! min-with-difference fold used by the 9j accumulator.

/// Signed prime exponent.
pub type Exp = i32;

/// Largest exponent the representation admits; also the sentinel installed
/// by [`ExpMut::set_max`] before a min-reduction.
pub const MAX_EXP: Exp = (u32::MAX >> 2) as Exp;

/// Exponent slots per record for `num_primes` primes: one header slot plus
/// the exponents, rounded up to whole 64-byte lines.
fn stride_for(num_primes: usize) -> usize {
    let bytes = (1 + num_primes) * std::mem::size_of::<Exp>();
    (bytes + 63) & !63
}

/// Arena of fixed-size prime-exponent records.
pub struct ExpArena {
    stride: usize,
    data: Vec<Exp>,
}

impl ExpArena {
    pub fn new(records: usize, num_primes: usize) -> ExpArena {
        let stride = stride_for(num_primes) / std::mem::size_of::<Exp>();
        ExpArena {
            stride,
            data: vec![0; records * stride],
        }
    }

    pub fn records(&self) -> usize {
        self.data.len() / self.stride
    }

    /// Exponent capacity of one record.
    pub fn record_capacity(&self) -> usize {
        self.stride - 1
    }

    /// Zero every record, headers included.
    pub fn zero_all(&mut self) {
        self.data.fill(0);
    }

    /// Copy all records of `other` into the leading records of `self`.
    /// Both arenas must share a stride; `self` must be at least as large.
    pub fn copy_records_from(&mut self, other: &ExpArena) {
        assert_eq!(self.stride, other.stride);
        self.data[..other.data.len()].copy_from_slice(&other.data);
    }

    #[inline]
    pub fn rec(&self, i: usize) -> ExpRef<'_> {
        ExpRef {
            rec: &self.data[i * self.stride..(i + 1) * self.stride],
        }
    }

    #[inline]
    pub fn rec_mut(&mut self, i: usize) -> ExpMut<'_> {
        let s = self.stride;
        ExpMut {
            rec: &mut self.data[i * s..(i + 1) * s],
        }
    }

    /// One mutable and one shared record, `dst != src`.
    pub fn rec_pair_mut(&mut self, dst: usize, src: usize) -> (ExpMut<'_>, ExpRef<'_>) {
        assert_ne!(dst, src);
        let s = self.stride;
        if dst < src {
            let (lo, hi) = self.data.split_at_mut(src * s);
            (
                ExpMut {
                    rec: &mut lo[dst * s..(dst + 1) * s],
                },
                ExpRef { rec: &hi[..s] },
            )
        } else {
            let (lo, hi) = self.data.split_at_mut(dst * s);
            (
                ExpMut { rec: &mut hi[..s] },
                ExpRef {
                    rec: &lo[src * s..(src + 1) * s],
                },
            )
        }
    }

    /// Two distinct mutable records.
    pub fn rec_pair_mut2(&mut self, a: usize, b: usize) -> (ExpMut<'_>, ExpMut<'_>) {
        assert_ne!(a, b);
        let s = self.stride;
        if a < b {
            let (lo, hi) = self.data.split_at_mut(b * s);
            (
                ExpMut {
                    rec: &mut lo[a * s..(a + 1) * s],
                },
                ExpMut { rec: &mut hi[..s] },
            )
        } else {
            let (b_view, a_view) = self.rec_pair_mut2(b, a);
            (a_view, b_view)
        }
    }

    /// `dst = a + b + c` over the common expanded width, all records of this
    /// arena. Used by the 9j accumulator to merge the three 6j numerators.
    pub fn expand_sum3_into(&mut self, dst: usize, a: usize, b: usize, c: usize) {
        let s = self.stride;
        let used = |arena: &Self, r: usize| arena.data[r * s] as usize;
        let (ua, ub, uc) = (used(self, a), used(self, b), used(self, c));
        let k = ua.max(ub).max(uc);
        debug_assert!(k < s);
        self.data[dst * s] = k as Exp;
        for i in 0..k {
            let za = if i < ua { self.data[a * s + 1 + i] } else { 0 };
            let zb = if i < ub { self.data[b * s + 1 + i] } else { 0 };
            let zc = if i < uc { self.data[c * s + 1 + i] } else { 0 };
            self.data[dst * s + 1 + i] = za + zb + zc;
        }
    }
}

/// Shared view of one record.
#[derive(Clone, Copy)]
pub struct ExpRef<'a> {
    rec: &'a [Exp],
}

impl ExpRef<'_> {
    #[inline]
    pub fn used(&self) -> usize {
        self.rec[0] as usize
    }

    /// Exponent at `i`, implicit zero past the active prefix.
    #[inline]
    pub fn z(&self, i: usize) -> Exp {
        if i < self.used() {
            self.rec[1 + i]
        } else {
            0
        }
    }
}

/// Mutable view of one record.
pub struct ExpMut<'a> {
    rec: &'a mut [Exp],
}

impl<'a> ExpMut<'a> {
    #[inline]
    pub fn used(&self) -> usize {
        self.rec[0] as usize
    }

    #[inline]
    pub fn as_ref(&self) -> ExpRef<'_> {
        ExpRef { rec: self.rec }
    }

    #[inline]
    pub fn z(&self, i: usize) -> Exp {
        if i < self.used() {
            self.rec[1 + i]
        } else {
            0
        }
    }

    #[inline]
    pub fn get(&self, i: usize) -> Exp {
        self.rec[1 + i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, v: Exp) {
        self.rec[1 + i] = v;
    }

    /// Active length `k`, first `k` exponents zeroed.
    pub fn set_zero(&mut self, k: usize) {
        self.rec[0] = k as Exp;
        self.rec[1..=k].fill(0);
    }

    /// Active length `k`, first `k` exponents at the sentinel maximum.
    pub fn set_max(&mut self, k: usize) {
        self.rec[0] = k as Exp;
        self.rec[1..=k].fill(MAX_EXP);
    }

    /// Raise the active length to `k`, zero-filling the newly live positions.
    pub fn expand(&mut self, k: usize) {
        let used = self.used();
        if used >= k {
            return;
        }
        self.rec[1 + used..=k].fill(0);
        self.rec[0] = k as Exp;
    }

    pub fn copy_from(&mut self, other: ExpRef<'_>) {
        let k = other.used();
        self.rec[0] = k as Exp;
        self.rec[1..=k].copy_from_slice(&other.rec[1..=k]);
    }

    /// Position-wise minimum with `other`; both operands must already share
    /// an active length.
    pub fn keep_min(&mut self, other: ExpRef<'_>) {
        debug_assert_eq!(self.used(), other.used());
        for i in 0..self.used() {
            self.rec[1 + i] = self.rec[1 + i].min(other.rec[1 + i]);
        }
    }

    /// Fold `other` into the running minimum while turning `other` into the
    /// difference `other - min_before`. Both views are first expanded to the
    /// common width so the implicit-zero tail participates.
    pub fn keep_min_in_as_diff(&mut self, other: &mut ExpMut<'_>) {
        let k = self.used().max(other.used());
        self.expand(k);
        other.expand(k);
        for i in 0..k {
            let tmp = other.rec[1 + i] - self.rec[1 + i];
            self.rec[1 + i] = self.rec[1 + i].min(other.rec[1 + i]);
            other.rec[1 + i] = tmp;
        }
    }

    /// Expand to `other`'s width and add its live prefix.
    pub fn expand_add(&mut self, other: ExpRef<'_>) {
        self.expand(other.used());
        for i in 0..other.used() {
            self.rec[1 + i] += other.rec[1 + i];
        }
    }

    /// Expand to `other`'s width and subtract its live prefix.
    pub fn expand_sub(&mut self, other: ExpRef<'_>) {
        self.expand(other.used());
        for i in 0..other.used() {
            self.rec[1 + i] -= other.rec[1 + i];
        }
    }

    /// Within the current width: `self += a + b + c - d`.
    pub fn add3_sub(&mut self, a: ExpRef<'_>, b: ExpRef<'_>, c: ExpRef<'_>, d: ExpRef<'_>) {
        for i in 0..self.used() {
            self.rec[1 + i] += a.z(i) + b.z(i) + c.z(i) - d.z(i);
        }
    }

    /// Within the current width: accumulate six terms.
    pub fn add6(&mut self, terms: [ExpRef<'_>; 6]) {
        for i in 0..self.used() {
            let mut acc = self.rec[1 + i];
            for t in &terms {
                acc += t.z(i);
            }
            self.rec[1 + i] = acc;
        }
    }

    /// Within the current width: accumulate seven terms.
    pub fn add7(&mut self, terms: [ExpRef<'_>; 7]) {
        for i in 0..self.used() {
            let mut acc = self.rec[1 + i];
            for t in &terms {
                acc += t.z(i);
            }
            self.rec[1 + i] = acc;
        }
    }

    /// Active length `k`, then `self = plus - m1 - ... - m7`.
    pub fn sum_sub7(&mut self, plus: ExpRef<'_>, minus: [ExpRef<'_>; 7], k: usize) {
        self.rec[0] = k as Exp;
        for i in 0..k {
            let mut acc = plus.z(i);
            for m in &minus {
                acc -= m.z(i);
            }
            self.rec[1 + i] = acc;
        }
    }

    /// Active length `k`, then `self = -(m1 + ... + m6)`.
    pub fn sum0_sub6(&mut self, minus: [ExpRef<'_>; 6], k: usize) {
        self.rec[0] = k as Exp;
        for i in 0..k {
            let mut acc = 0;
            for m in &minus {
                acc -= m.z(i);
            }
            self.rec[1 + i] = acc;
        }
    }
}
