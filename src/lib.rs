//! Integer factorization, from trial division up to the multiple polynomial
//! quadratic sieve.
//!
//! The library entry point is [`factor`], which splits its argument into
//! probable primes using one of the registered algorithms:
//!
//! ```
//! use mpqs_factor::factor;
//! use num_bigint::BigInt;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let factors = factor(&BigInt::from(-42), "trial", &mut rng).unwrap();
//! assert_eq!(factors, [-1, 2, 3, 7].map(BigInt::from));
//! ```
//!
//! For a fixed seed the result is fully deterministic, including the
//! multi-threaded `mpqs` algorithm, which consumes worker results in task
//! order.

pub mod arith;
pub mod ecm;
pub mod matrix;
pub mod modmath;
pub mod mpqs;
pub mod primepower;
pub mod primes;
pub mod qs;
pub mod relations;
pub mod sieve;
pub mod trial;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use rand::rngs::StdRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactorError {
    #[error("unknown algorithm: {0} (possible algorithms: {})", algorithm_names())]
    UnknownAlgorithm(String),
    #[error("{0} is not a prime power")]
    NotPrimePower(BigInt),
}

fn algorithm_names() -> String {
    ALGORITHMS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// An algorithm splits a positive composite into two or more nontrivial
/// parts (not necessarily prime).
pub type AlgorithmFn = fn(&BigInt, &mut StdRng) -> Result<Vec<BigInt>, FactorError>;

/// The algorithm registry. All lookup goes through this one table.
pub const ALGORITHMS: &[(&str, AlgorithmFn)] = &[
    ("trial", trial::factor),
    ("primepower", primepower::factor),
    ("ecm", ecm::factor),
    ("qs", qs::factor),
    ("mpqs", mpqs::factor),
];

/// The prime factorization of n, computed with the named algorithm.
///
/// Returns the factors in ascending order; their product is n. A negative n
/// contributes a leading -1; factors of 1 are dropped, so `factor(1)` is
/// empty and `factor(-1)` is `[-1]`. `factor(0)` is `[0]`. Every other
/// returned element passes 1000 rounds of Miller-Rabin.
pub fn factor(n: &BigInt, alg: &str, rng: &mut StdRng) -> Result<Vec<BigInt>, FactorError> {
    let Some(&(_, split)) = ALGORITHMS.iter().find(|(name, _)| *name == alg) else {
        return Err(FactorError::UnknownAlgorithm(alg.to_string()));
    };

    if n.is_zero() {
        return Ok(vec![BigInt::zero()]);
    }

    // Keep splitting composite entries until everything left is a unit or a
    // probable prime.
    let mut factors = vec![n.clone()];
    let mut i = 0;
    while i < factors.len() {
        let f = factors[i].clone();

        if f.is_negative() {
            factors[i] = BigInt::from(-1);
            factors.push(-f);
            i += 1;
            continue;
        }
        if f.is_one() {
            factors.remove(i);
            continue;
        }
        if arith::is_probably_prime(&f, 1000, rng) {
            i += 1;
            continue;
        }

        let parts = split(&f, rng)?;

        // The algorithms must hand back a genuine factorization.
        let mut product = BigInt::one();
        for part in &parts {
            if part.is_one() || *part == f {
                panic!("algorithm returned a trivial factor of {}", f);
            }
            if *part < BigInt::one() || *part > f {
                panic!("algorithm returned an out-of-range factor of {}", f);
            }
            product *= part;
        }
        assert_eq!(product, f, "algorithm split does not multiply back");

        factors[i] = parts[0].clone();
        factors.extend_from_slice(&parts[1..]);
    }

    factors.sort();

    let product: BigInt = factors.iter().product();
    assert_eq!(product, *n, "factorization does not multiply back to n");
    Ok(factors)
}
