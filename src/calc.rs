//! The symbol evaluator: selection rules, Racah sums in prime-exponent
//! space, and the final conversion to a double.
//!
//! Every sum is assembled exactly. Each Racah term is a ratio of factorials
//! held as a prime-exponent vector; subtracting the position-wise minimum
//! over all terms turns every term into a non-negative vector, whose prime
//! product is an integer `BigInt`. The signed integer sum, the common
//! minimum, and the (squared) prefactor only meet floating point in the very
//! last step, where the prefactor's odd exponents are split off as a pending
//! square root.
//!
//! All arithmetic is on doubled quantum numbers, so half-integers stay
//! integral throughout.

use tracing::error;

use crate::big_int::BigInt;
use crate::error::{fatal, Fatal};
use crate::pool::GlobalPool;
use crate::scratch::{
    with_scratch, Scratch, ITER_START, MIN_NUME, NUME_TRIPROD, PREFACT, TRIPROD_FX,
};

/// `x * 2^e` without losing extreme exponents to intermediate overflow.
fn ldexp(mut x: f64, mut e: i32) -> f64 {
    while e > 1023 {
        x *= 2f64.powi(1023);
        e -= 1023;
    }
    while e < -1022 {
        x *= 2f64.powi(-1022);
        e += 1022;
    }
    x * 2f64.powi(e)
}

// ---- trivial-zero selection rules -------------------------------------

// The rules accumulate all negativity into the sign bit of one OR and all
// parity violations into the low bit of another, so a whole symbol checks
// with two tests.

#[inline]
fn acc_negative(two_j1: i32, two_j2: i32, two_j3: i32, sign: &mut i32) {
    *sign |= two_j1 | two_j2 | two_j3;
}

#[inline]
fn acc_triangle(two_j1: i32, two_j2: i32, two_j3: i32, sign: &mut i32, odd: &mut i32) {
    *odd |= two_j1 + two_j2 + two_j3;
    *sign |= two_j2 + two_j3 - two_j1;
    *sign |= two_j3 + two_j1 - two_j2;
    *sign |= two_j1 + two_j2 - two_j3;
}

#[inline]
fn acc_m_range(two_m: i32, two_j: i32, sign: &mut i32, odd: &mut i32) {
    *odd |= two_m + two_j;
    *sign |= two_j - two_m;
    *sign |= two_j + two_m;
}

pub(crate) fn is_zero_3j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_m1: i32,
    two_m2: i32,
    two_m3: i32,
) -> bool {
    let mut sign = 0;
    let mut odd = 0;
    acc_negative(two_j1, two_j2, two_j3, &mut sign);
    acc_triangle(two_j1, two_j2, two_j3, &mut sign, &mut odd);
    acc_m_range(two_m1, two_j1, &mut sign, &mut odd);
    acc_m_range(two_m2, two_j2, &mut sign, &mut odd);
    acc_m_range(two_m3, two_j3, &mut sign, &mut odd);
    two_m1 + two_m2 + two_m3 != 0 || sign < 0 || odd & 1 == 1
}

pub(crate) fn is_zero_6j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
) -> bool {
    let mut sign = 0;
    let mut odd = 0;
    acc_negative(two_j1, two_j2, two_j3, &mut sign);
    acc_negative(two_j4, two_j5, two_j6, &mut sign);
    acc_triangle(two_j1, two_j2, two_j3, &mut sign, &mut odd);
    acc_triangle(two_j1, two_j5, two_j6, &mut sign, &mut odd);
    acc_triangle(two_j4, two_j2, two_j6, &mut sign, &mut odd);
    acc_triangle(two_j4, two_j5, two_j3, &mut sign, &mut odd);
    sign < 0 || odd & 1 == 1
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn is_zero_9j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
    two_j7: i32,
    two_j8: i32,
    two_j9: i32,
) -> bool {
    let mut sign = 0;
    let mut odd = 0;
    acc_negative(two_j1, two_j2, two_j3, &mut sign);
    acc_negative(two_j4, two_j5, two_j6, &mut sign);
    acc_negative(two_j7, two_j8, two_j9, &mut sign);
    acc_triangle(two_j1, two_j2, two_j3, &mut sign, &mut odd);
    acc_triangle(two_j4, two_j5, two_j6, &mut sign, &mut odd);
    acc_triangle(two_j7, two_j8, two_j9, &mut sign, &mut odd);
    acc_triangle(two_j1, two_j4, two_j7, &mut sign, &mut odd);
    acc_triangle(two_j2, two_j5, two_j8, &mut sign, &mut odd);
    acc_triangle(two_j3, two_j6, two_j9, &mut sign, &mut odd);
    sign < 0 || odd & 1 == 1
}

// ---- sum assembly -----------------------------------------------------

/// Fold `Δ(a, b, c)` (squared, in exponent space) into a bank slot:
/// the three triangle factorials over `((a+b+c)/2 + 1)!`.
fn delta_coeff(pool: &GlobalPool, s: &mut Scratch, slot: usize, two_a: i32, two_b: i32, two_c: i32) {
    let denom = ((two_a + two_b + two_c) / 2 + 1) as usize;
    if denom > pool.table.max_factorial {
        error!(denom, cap = pool.table.max_factorial, "delta_coeff: factorial out of range");
        fatal(Fatal::FactorialTooLarge);
    }
    let n1 = pool.factorial(((two_a + two_b - two_c) / 2) as usize);
    let n2 = pool.factorial(((two_a - two_b + two_c) / 2) as usize);
    let n3 = pool.factorial(((-two_a + two_b + two_c) / 2) as usize);
    let d1 = pool.factorial(denom);
    let mut dst = s.bank.rec_mut(slot);
    dst.expand(d1.used());
    dst.add3_sub(n1, n2, n3, d1);
}

fn calcsum_3j(
    pool: &GlobalPool,
    s: &mut Scratch,
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_m1: i32,
    two_m2: i32,
    two_m3: i32,
) {
    let k_min = (two_j1 + two_m2 - two_j3).max(two_j2 - two_m1 - two_j3).max(0) / 2;
    let k_max = (two_j2 + two_m2).min(two_j1 - two_m1).min(two_j1 + two_j2 - two_j3) / 2;

    let max_factorial = ((two_j1 + two_j2 + two_j3) / 2 + 1) as usize;
    if max_factorial > pool.table.max_factorial {
        error!(max_factorial, cap = pool.table.max_factorial, "calcsum_3j: factorial out of range");
        fatal(Fatal::FactorialTooLarge);
    }
    let max_used = pool.factorial(max_factorial).used();

    if k_max < k_min {
        s.bank.rec_mut(MIN_NUME).set_zero(0);
        s.sum_prod.set_word(0);
    } else {
        let k_lim = (k_max - k_min) as usize;
        s.ensure_iter_capacity(k_lim + 1);
        s.bank.rec_mut(MIN_NUME).set_max(max_used);

        let offset1 = k_min + (two_j3 - two_j1 - two_m2) / 2;
        let offset2 = k_min + (two_j3 - two_j2 + two_m1) / 2;
        let fixed1 = (two_j2 + two_m2) / 2 - k_min;
        let fixed2 = (two_j1 - two_m1) / 2 - k_min;
        let fixed3 = (two_j1 + two_j2 - two_j3) / 2 - k_min;

        for k in 0..=k_lim {
            let ki = k as i32;
            let d1 = pool.factorial((k_min + ki) as usize);
            let d2 = pool.factorial((offset1 + ki) as usize);
            let d3 = pool.factorial((offset2 + ki) as usize);
            let d4 = pool.factorial((fixed1 - ki) as usize);
            let d5 = pool.factorial((fixed2 - ki) as usize);
            let d6 = pool.factorial((fixed3 - ki) as usize);

            s.bank
                .rec_mut(ITER_START + k)
                .sum0_sub6([d1, d2, d3, d4, d5, d6], max_used);
            let (mut min_nume, nume) = s.bank.rec_pair_mut(MIN_NUME, ITER_START + k);
            min_nume.keep_min(nume);
        }

        let sign0 = k_min ^ ((two_j1 - two_j2 - two_m3) / 2);
        let mut sum = BigInt::new();
        for k in 0..=k_lim {
            {
                let (mut nume, min_nume) = s.bank.rec_pair_mut(ITER_START + k, MIN_NUME);
                nume.expand_sub(min_nume);
            }
            s.eval
                .evaluate(&pool.table.primes, s.bank.rec(ITER_START + k), &mut s.big_prod);
            if (k as i32 ^ sign0) & 1 == 1 {
                sum -= &s.big_prod;
            } else {
                sum += &s.big_prod;
            }
        }
        s.sum_prod = sum;
    }

    s.bank.rec_mut(PREFACT).set_zero(0);
    delta_coeff(pool, s, PREFACT, two_j1, two_j2, two_j3);
    let n4 = pool.factorial(((two_j1 - two_m1) / 2) as usize);
    let n5 = pool.factorial(((two_j1 + two_m1) / 2) as usize);
    let n6 = pool.factorial(((two_j2 - two_m2) / 2) as usize);
    let n7 = pool.factorial(((two_j2 + two_m2) / 2) as usize);
    let n8 = pool.factorial(((two_j3 - two_m3) / 2) as usize);
    let n9 = pool.factorial(((two_j3 + two_m3) / 2) as usize);
    s.bank.rec_mut(PREFACT).add6([n4, n5, n6, n7, n8, n9]);
}

/// The shared 6j sum core: writes the min-normalized numerator into
/// `min_slot` and returns the signed integer sum. The relabeling
/// `(a,b,c,d,e,f) = (j1,j2,j5,j4,j3,j6)` matches the Racah single-sum form.
fn factor_6j(
    pool: &GlobalPool,
    s: &mut Scratch,
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
    min_slot: usize,
) -> BigInt {
    let (two_a, two_b, two_c, two_d, two_e, two_f) =
        (two_j1, two_j2, two_j5, two_j4, two_j3, two_j6);

    let alpha1 = two_a + two_b + two_e;
    let alpha2 = two_c + two_d + two_e;
    let alpha3 = two_a + two_c + two_f;
    let alpha4 = two_b + two_d + two_f;
    let beta1 = two_a + two_b + two_c + two_d;
    let beta2 = two_a + two_d + two_e + two_f;
    let beta3 = two_b + two_c + two_e + two_f;

    let k_min = alpha1.max(alpha2).max(alpha3).max(alpha4) / 2;
    let k_max = beta1.min(beta2).min(beta3) / 2;

    let max_factorial =
        ((k_max + 1).max(beta1 / 2).max(beta2 / 2).max(beta3 / 2)) as usize;
    if max_factorial > pool.table.max_factorial {
        error!(max_factorial, cap = pool.table.max_factorial, "factor_6j: factorial out of range");
        fatal(Fatal::FactorialTooLarge);
    }
    let max_used = pool.factorial(max_factorial).used();

    if k_max < k_min {
        s.bank.rec_mut(min_slot).set_zero(0);
        return BigInt::new();
    }

    let k_lim = (k_max - k_min) as usize;
    s.ensure_iter_capacity(k_lim + 1);
    s.bank.rec_mut(min_slot).set_max(max_used);

    let d1 = k_min - alpha1 / 2;
    let d2 = k_min - alpha2 / 2;
    let d3 = k_min - alpha3 / 2;
    let d4 = k_min - alpha4 / 2;
    let d5 = beta1 / 2 - k_min;
    let d6 = beta2 / 2 - k_min;
    let d7 = beta3 / 2 - k_min;

    for k in 0..=k_lim {
        let ki = k as i32;
        let p_n1 = pool.factorial((k_min + 1 + ki) as usize);
        let p_d1 = pool.factorial((d1 + ki) as usize);
        let p_d2 = pool.factorial((d2 + ki) as usize);
        let p_d3 = pool.factorial((d3 + ki) as usize);
        let p_d4 = pool.factorial((d4 + ki) as usize);
        let p_d5 = pool.factorial((d5 - ki) as usize);
        let p_d6 = pool.factorial((d6 - ki) as usize);
        let p_d7 = pool.factorial((d7 - ki) as usize);

        s.bank
            .rec_mut(ITER_START + k)
            .sum_sub7(p_n1, [p_d1, p_d2, p_d3, p_d4, p_d5, p_d6, p_d7], max_used);
        let (mut min_nume, nume) = s.bank.rec_pair_mut(min_slot, ITER_START + k);
        min_nume.keep_min(nume);
    }

    let mut sum = BigInt::new();
    for k in 0..=k_lim {
        {
            let (mut nume, min_nume) = s.bank.rec_pair_mut(ITER_START + k, min_slot);
            nume.expand_sub(min_nume);
        }
        s.eval
            .evaluate(&pool.table.primes, s.bank.rec(ITER_START + k), &mut s.big_prod);
        if (k as i32 ^ k_min) & 1 == 1 {
            sum -= &s.big_prod;
        } else {
            sum += &s.big_prod;
        }
    }
    sum
}

fn calcsum_6j(
    pool: &GlobalPool,
    s: &mut Scratch,
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
) {
    let sum = factor_6j(pool, s, two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, MIN_NUME);
    s.sum_prod = sum;

    s.bank.rec_mut(PREFACT).set_zero(0);
    delta_coeff(pool, s, PREFACT, two_j1, two_j2, two_j3);
    delta_coeff(pool, s, PREFACT, two_j5, two_j4, two_j3);
    delta_coeff(pool, s, PREFACT, two_j1, two_j5, two_j6);
    delta_coeff(pool, s, PREFACT, two_j2, two_j4, two_j6);
}

/// 9j as a sum over the auxiliary coupling `two_k` of a product of three
/// 6j factors, accumulated exactly against a running minimum vector.
#[allow(clippy::too_many_arguments)]
fn calcsum_9j(
    pool: &GlobalPool,
    s: &mut Scratch,
    two_a: i32,
    two_b: i32,
    two_c: i32,
    two_d: i32,
    two_e: i32,
    two_f: i32,
    two_g: i32,
    two_h: i32,
    two_i: i32,
) {
    let two_k_min = (two_h - two_d)
        .abs()
        .max((two_b - two_f).abs())
        .max((two_a - two_i).abs());
    let two_k_max = (two_h + two_d).min(two_b + two_f).min(two_a + two_i);

    s.bank.rec_mut(MIN_NUME).set_zero(0);
    s.sum_prod.set_word(0);

    let mut two_k = two_k_min;
    while two_k <= two_k_max {
        let f1 = factor_6j(pool, s, two_a, two_b, two_c, two_f, two_i, two_k, TRIPROD_FX);
        s.triprod = f1;
        let f2 = factor_6j(pool, s, two_f, two_d, two_e, two_h, two_b, two_k, TRIPROD_FX + 1);
        s.triprod_factor = f2;
        s.triprod_tmp = &s.triprod * &s.triprod_factor;
        let f3 = factor_6j(pool, s, two_h, two_i, two_g, two_a, two_d, two_k, TRIPROD_FX + 2);
        s.triprod_factor = f3;
        s.triprod = &s.triprod_tmp * &s.triprod_factor;

        s.bank
            .expand_sum3_into(NUME_TRIPROD, TRIPROD_FX, TRIPROD_FX + 1, TRIPROD_FX + 2);
        delta_coeff(pool, s, NUME_TRIPROD, two_a, two_i, two_k);
        delta_coeff(pool, s, NUME_TRIPROD, two_f, two_b, two_k);
        delta_coeff(pool, s, NUME_TRIPROD, two_h, two_d, two_k);
        s.bank
            .rec_mut(NUME_TRIPROD)
            .expand_add(pool.number((two_k + 1) as usize));

        if two_k == two_k_min {
            let (mut min_nume, nume_triprod) = s.bank.rec_pair_mut(MIN_NUME, NUME_TRIPROD);
            min_nume.copy_from(nume_triprod);
            s.big_nume.set_word(1);
            s.big_div.set_word(1);
        } else {
            {
                let (mut min_nume, mut nume_triprod) =
                    s.bank.rec_pair_mut2(MIN_NUME, NUME_TRIPROD);
                min_nume.keep_min_in_as_diff(&mut nume_triprod);
            }
            // Positive difference: this term sits above the running minimum
            // and is scaled up. Negative difference: the minimum dropped and
            // the accumulated sum is rescaled instead.
            s.eval.evaluate2(
                &pool.table.primes,
                s.bank.rec(NUME_TRIPROD),
                &mut s.big_div,
                &mut s.big_nume,
            );
        }

        s.triprod_tmp = &s.triprod * &s.big_div;
        s.sum_prod *= &s.big_nume;
        if two_k & 1 == 1 {
            s.sum_prod -= &s.triprod_tmp;
        } else {
            s.sum_prod += &s.triprod_tmp;
        }

        two_k += 2;
    }

    s.bank.rec_mut(PREFACT).set_zero(0);
    delta_coeff(pool, s, PREFACT, two_a, two_b, two_c);
    delta_coeff(pool, s, PREFACT, two_d, two_e, two_f);
    delta_coeff(pool, s, PREFACT, two_g, two_h, two_i);
    delta_coeff(pool, s, PREFACT, two_a, two_d, two_g);
    delta_coeff(pool, s, PREFACT, two_b, two_e, two_h);
    delta_coeff(pool, s, PREFACT, two_c, two_f, two_i);
}

// ---- final evaluation -------------------------------------------------

/// Halve the prefactor exponents, extracting odd remainders into a pending
/// square-root product, then fold in the numerator normalization.
fn split_sqrt_add(pool: &GlobalPool, s: &mut Scratch) {
    let primes = &pool.table.primes;
    s.big_sqrt.set_word(1);
    let (mut prefact, min_nume) = s.bank.rec_pair_mut(PREFACT, MIN_NUME);
    let width = prefact.used().max(min_nume.used());
    prefact.expand(width);
    for i in 0..width {
        let e = prefact.get(i);
        let odd = e & 1;
        prefact.set(i, (e + odd) / 2 + min_nume.z(i));
        if odd != 0 {
            s.big_sqrt *= primes[i];
        }
    }
}

fn eval_calcsum_info(pool: &GlobalPool, s: &mut Scratch) -> f64 {
    split_sqrt_add(pool, s);

    s.eval.evaluate2(
        &pool.table.primes,
        s.bank.rec(PREFACT),
        &mut s.big_nume,
        &mut s.big_div,
    );
    s.big_nume_prod = &s.big_nume * &s.sum_prod;

    let (m_nume_prod, e_nume_prod) = s.big_nume_prod.to_floating();
    let (m_div, e_div) = s.big_div.to_floating();
    let (m_sqrt, e_sqrt) = s.big_sqrt.to_floating();

    let r = (m_nume_prod / m_div) / m_sqrt.sqrt();
    ldexp(r, e_nume_prod - e_div - e_sqrt / 2)
}

// ---- public entry points ----------------------------------------------

pub(crate) fn calc_3j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_m1: i32,
    two_m2: i32,
    two_m3: i32,
) -> f64 {
    if is_zero_3j(two_j1, two_j2, two_j3, two_m1, two_m2, two_m3) {
        return 0.0;
    }
    with_scratch(|pool, s| {
        calcsum_3j(pool, s, two_j1, two_j2, two_j3, two_m1, two_m2, two_m3);
        eval_calcsum_info(pool, s)
    })
}

pub(crate) fn calc_6j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
) -> f64 {
    if is_zero_6j(two_j1, two_j2, two_j3, two_j4, two_j5, two_j6) {
        return 0.0;
    }
    with_scratch(|pool, s| {
        calcsum_6j(pool, s, two_j1, two_j2, two_j3, two_j4, two_j5, two_j6);
        eval_calcsum_info(pool, s)
    })
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn calc_9j(
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
    if is_zero_9j(
        two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, two_j7, two_j8, two_j9,
    ) {
        return 0.0;
    }
    with_scratch(|pool, s| {
        calcsum_9j(
            pool, s, two_j1, two_j2, two_j3, two_j4, two_j5, two_j6, two_j7, two_j8, two_j9,
        );
        eval_calcsum_info(pool, s)
    })
}

/// Clebsch–Gordan through the 3j sum, with `(2J+1)` folded into the
/// prefactor so its square root is extracted exactly.
pub(crate) fn calc_cg(
    two_j1: i32,
    two_j2: i32,
    two_m1: i32,
    two_m2: i32,
    two_big_j: i32,
    two_big_m: i32,
) -> f64 {
    if is_zero_3j(two_j1, two_j2, two_big_j, two_m1, two_m2, -two_big_m) {
        return 0.0;
    }
    let value = with_scratch(|pool, s| {
        calcsum_3j(pool, s, two_j1, two_j2, two_big_j, two_m1, two_m2, -two_big_m);
        s.bank
            .rec_mut(PREFACT)
            .expand_add(pool.number((two_big_j + 1) as usize));
        eval_calcsum_info(pool, s)
    });
    if ((two_j1 - two_j2 + two_big_m) / 2) & 1 == 1 {
        -value
    } else {
        value
    }
}
