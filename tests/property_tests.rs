//! Property-based tests for racah's arithmetic core and symbol identities.
//!
//! These tests use the `proptest` framework to verify invariants across
//! thousands of randomly generated inputs. The multi-word integer is
//! cross-validated against GMP (via `rug::Integer`), and the symbol
//! evaluator is checked against the exchange-symmetry and Clebsch–Gordan
//! identities that must hold for every valid argument tuple.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! # Testing strategy
//!
//! - **BigInt vs GMP**: addition, subtraction and multiplication compared
//!   through canonical hex strings.
//! - **Algebraic laws**: associativity of multiplication, negation as an
//!   involution, `a + (-a) = 0`, hex round-trips.
//! - **Symbol identities**: 3j exchange symmetry and the CG–3j relation on
//!   randomly drawn (j, m) tuples, including half-integer momenta.
//! - **Selection rules**: constructed violations must return exactly 0.0.

use proptest::prelude::*;
use racah::big_int::BigInt;
use rug::Integer;

/// Signed hex string strategy, up to 64 digits (8+ words of payload; longer
/// tails add nothing past the carry chains already exercised here).
fn hex_value() -> impl Strategy<Value = String> {
    ("[1-9a-f][0-9a-f]{0,63}", any::<bool>()).prop_map(|(digits, negative)| {
        if negative {
            format!("-{digits}")
        } else {
            digits
        }
    })
}

fn to_rug(hex: &str) -> Integer {
    Integer::from_str_radix(hex, 16).unwrap()
}

proptest! {
    /// Addition agrees with GMP through canonical hex.
    #[test]
    fn prop_bigint_add_matches_gmp(a in hex_value(), b in hex_value()) {
        let mut sum = BigInt::from_hex_str(&a).unwrap();
        sum += &BigInt::from_hex_str(&b).unwrap();
        let expected = to_rug(&a) + to_rug(&b);
        prop_assert_eq!(sum.to_hex_string(), expected.to_string_radix(16));
    }

    /// Subtraction agrees with GMP through canonical hex.
    #[test]
    fn prop_bigint_sub_matches_gmp(a in hex_value(), b in hex_value()) {
        let mut diff = BigInt::from_hex_str(&a).unwrap();
        diff -= &BigInt::from_hex_str(&b).unwrap();
        let expected = to_rug(&a) - to_rug(&b);
        prop_assert_eq!(diff.to_hex_string(), expected.to_string_radix(16));
    }

    /// The sign-extended schoolbook product agrees with GMP.
    #[test]
    fn prop_bigint_mul_matches_gmp(a in hex_value(), b in hex_value()) {
        let prod = &BigInt::from_hex_str(&a).unwrap() * &BigInt::from_hex_str(&b).unwrap();
        let expected = to_rug(&a) * to_rug(&b);
        prop_assert_eq!(prod.to_hex_string(), expected.to_string_radix(16));
    }

    /// (a*b)*c = a*(b*c).
    #[test]
    fn prop_bigint_mul_associative(a in hex_value(), b in hex_value(), c in hex_value()) {
        let a = BigInt::from_hex_str(&a).unwrap();
        let b = BigInt::from_hex_str(&b).unwrap();
        let c = BigInt::from_hex_str(&c).unwrap();
        prop_assert_eq!(&(&a * &b) * &c, &a * &(&b * &c));
    }

    /// Negation is an involution and a + (-a) = 0.
    #[test]
    fn prop_bigint_negation_laws(a in hex_value()) {
        let a = BigInt::from_hex_str(&a).unwrap();
        prop_assert_eq!(-&-&a, a.clone());
        let mut sum = a.clone();
        sum += &(-&a);
        prop_assert_eq!(sum, BigInt::from_word(0));
    }

    /// to_hex(from_hex(x)) = x for canonical inputs.
    #[test]
    fn prop_bigint_hex_roundtrip(a in hex_value()) {
        let value = BigInt::from_hex_str(&a).unwrap();
        prop_assert_eq!(value.to_hex_string(), a);
    }

    /// Multiplying a non-negative value by a single word matches the full
    /// product path (the word form is defined for non-negative values only).
    #[test]
    fn prop_bigint_word_mul_matches_big_mul(a in "[1-9a-f][0-9a-f]{0,63}", w in 0u32..u32::MAX) {
        let a = BigInt::from_hex_str(&a).unwrap();
        let mut word_path = a.clone();
        word_path *= w;
        let mut rhs = BigInt::new();
        rhs.set_u64(w as u64);
        prop_assert_eq!(word_path, &a * &rhs);
    }
}

proptest! {
    /// 3j(j1,j2,j3; m1,m2,m3) = (-1)^{j1+j2+j3} 3j(j2,j1,j3; m2,m1,m3).
    #[test]
    fn prop_three_j_exchange_symmetry(
        two_j1 in 0i32..=30,
        two_j2 in 0i32..=30,
        d in 0i32..=30,
        a1 in 0i32..1000,
        a2 in 0i32..1000,
    ) {
        racah::global_init(2 * 100, 3);
        let two_j3 = two_j1 + two_j2 - 2 * (d % (two_j1.min(two_j2) + 1));
        let two_m1 = -two_j1 + 2 * (a1 % (two_j1 + 1));
        let two_m2 = -two_j2 + 2 * (a2 % (two_j2 + 1));
        let two_m3 = -(two_m1 + two_m2);

        let lhs = racah::three_j(two_j1, two_j2, two_j3, two_m1, two_m2, two_m3);
        let rhs = racah::three_j(two_j2, two_j1, two_j3, two_m2, two_m1, two_m3);
        let phase = if ((two_j1 + two_j2 + two_j3) / 2) & 1 == 1 { -1.0 } else { 1.0 };
        prop_assert!(
            (lhs - phase * rhs).abs() <= 1e-12 * lhs.abs().max(1e-30),
            "lhs = {}, rhs = {}", lhs, rhs
        );
    }

    /// cg = (-1)^{(j1-j2+M)/2} sqrt(2J+1) 3j(j1,j2,J; m1,m2,-M).
    #[test]
    fn prop_cg_matches_three_j(
        two_j1 in 0i32..=30,
        two_j2 in 0i32..=30,
        d in 0i32..=30,
        a1 in 0i32..1000,
        a2 in 0i32..1000,
    ) {
        racah::global_init(2 * 100, 3);
        let two_jj = two_j1 + two_j2 - 2 * (d % (two_j1.min(two_j2) + 1));
        let two_m1 = -two_j1 + 2 * (a1 % (two_j1 + 1));
        let two_m2 = -two_j2 + 2 * (a2 % (two_j2 + 1));
        let two_mm = two_m1 + two_m2;

        let direct = racah::cg(two_j1, two_j2, two_m1, two_m2, two_jj, two_mm);
        let threej = racah::three_j(two_j1, two_j2, two_jj, two_m1, two_m2, -two_mm);
        let phase = if ((two_j1 - two_j2 + two_mm) / 2) & 1 == 1 { -1.0 } else { 1.0 };
        let via_3j = phase * ((two_jj + 1) as f64).sqrt() * threej;
        prop_assert!(
            (direct - via_3j).abs() <= 1e-13 * direct.abs().max(1e-30),
            "direct = {}, via 3j = {}", direct, via_3j
        );
    }

    /// Triangle violations and m-sum violations return exactly zero.
    #[test]
    fn prop_selection_rule_zero(
        two_j1 in 0i32..=30,
        two_j2 in 0i32..=30,
        a1 in 0i32..1000,
    ) {
        racah::global_init(2 * 100, 3);
        // j3 beyond the triangle bound.
        let two_j3 = two_j1 + two_j2 + 2;
        let two_m1 = -two_j1 + 2 * (a1 % (two_j1 + 1));
        prop_assert_eq!(
            racah::three_j(two_j1, two_j2, two_j3, two_m1, 0, -two_m1),
            0.0
        );
        // m-sum violation on an otherwise valid triple.
        if two_j1 >= 2 {
            prop_assert_eq!(
                racah::three_j(two_j1, two_j1, 0, two_j1, -two_j1 + 2, 0),
                0.0
            );
        }
    }
}
