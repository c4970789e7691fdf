//! End-to-end factorization scenarios across all algorithms.

use mpqs_factor::{arith, factor, FactorError};
use num_bigint::BigInt;
use num_traits::One;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// The product of the factors must be n and every non-unit factor must be a
/// probable prime.
fn check_factorization(n: &BigInt, factors: &[BigInt]) {
    let product: BigInt = factors.iter().product();
    assert_eq!(&product, n, "factors of {} do not multiply back", n);
    let mut mr = StdRng::seed_from_u64(99);
    for f in factors {
        if *f == BigInt::from(-1) {
            continue;
        }
        assert!(
            arith::is_probably_prime(f, 1000, &mut mr),
            "factor {} of {} is not prime",
            f,
            n
        );
    }
}

#[test]
fn test_zero_and_units() {
    let mut rng = rng();
    assert_eq!(
        factor(&BigInt::from(0), "trial", &mut rng).unwrap(),
        vec![BigInt::from(0)]
    );
    assert!(factor(&BigInt::one(), "trial", &mut rng).unwrap().is_empty());
    assert_eq!(
        factor(&BigInt::from(-1), "trial", &mut rng).unwrap(),
        vec![BigInt::from(-1)]
    );
}

#[test]
fn test_negative_composite() {
    let mut rng = rng();
    let factors = factor(&BigInt::from(-42), "trial", &mut rng).unwrap();
    assert_eq!(factors, [-1, 2, 3, 7].map(BigInt::from));
}

#[test]
fn test_large_prime_passes_through() {
    // The largest prime below 2^63 is already prime; no algorithm runs.
    let mut rng = rng();
    let p = BigInt::parse_bytes(b"9223372036854775783", 10).unwrap();
    let factors = factor(&p, "mpqs", &mut rng).unwrap();
    assert_eq!(factors, vec![p]);
}

#[test]
fn test_semiprime_via_mpqs() {
    let mut rng = rng();
    let n = BigInt::from(999_942_000_697i64); // 999959 * 999983
    let factors = factor(&n, "mpqs", &mut rng).unwrap();
    assert_eq!(factors, vec![BigInt::from(999_959), BigInt::from(999_983)]);
}

#[test]
fn test_semiprime_via_qs() {
    let mut rng = rng();
    let n = BigInt::from(999_942_000_697i64);
    let factors = factor(&n, "qs", &mut rng).unwrap();
    assert_eq!(factors, vec![BigInt::from(999_959), BigInt::from(999_983)]);
}

#[test]
fn test_prime_power_via_primepower_and_mpqs() {
    let n = BigInt::from(96_889_010_407i64); // 7^13
    let want = vec![BigInt::from(7); 13];

    let mut rng1 = rng();
    assert_eq!(factor(&n, "primepower", &mut rng1).unwrap(), want);

    // mpqs rejects prime powers up front and returns the same answer.
    let mut rng2 = rng();
    assert_eq!(factor(&n, "mpqs", &mut rng2).unwrap(), want);
}

#[test]
fn test_primepower_rejects_other_input() {
    let mut rng = rng();
    let err = factor(&BigInt::from(42), "primepower", &mut rng).unwrap_err();
    assert!(matches!(err, FactorError::NotPrimePower(_)));
}

#[test]
fn test_unknown_algorithm() {
    let mut rng = rng();
    let err = factor(&BigInt::from(42), "pollard", &mut rng).unwrap_err();
    assert!(matches!(err, FactorError::UnknownAlgorithm(_)));
}

#[test]
fn test_ecm_semiprime() {
    let mut rng = rng();
    let n = BigInt::from(10_403); // 101 * 103
    let factors = factor(&n, "ecm", &mut rng).unwrap();
    assert_eq!(factors, vec![BigInt::from(101), BigInt::from(103)]);
}

#[test]
fn test_factorization_invariants() {
    // A spread of shapes: squares, smooth numbers, mixed composites.
    let cases: &[i64] = &[4, 36, 97, 1000, 9409, 1_042_297, 96_889_010_407, -360];
    for &c in cases {
        let mut rng = rng();
        let n = BigInt::from(c);
        let factors = factor(&n, "trial", &mut rng).unwrap();
        check_factorization(&n, &factors);
    }
}

#[test]
fn test_qs_matches_trial() {
    let mut rng1 = rng();
    let mut rng2 = rng();
    let n = BigInt::from(1_042_297i64); // 1009 * 1033
    let via_trial = factor(&n, "trial", &mut rng1).unwrap();
    let via_qs = factor(&n, "qs", &mut rng2).unwrap();
    assert_eq!(via_trial, via_qs);
    check_factorization(&n, &via_qs);
}

#[test]
fn test_mpqs_larger_semiprime() {
    // 48-bit: 16290047 * 16290073
    let mut rng = rng();
    let n = BigInt::from(16_290_047i64) * BigInt::from(16_290_073i64);
    let factors = factor(&n, "mpqs", &mut rng).unwrap();
    assert_eq!(
        factors,
        vec![BigInt::from(16_290_047), BigInt::from(16_290_073)]
    );
}
