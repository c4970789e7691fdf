//! Detection and factorization of perfect prime powers n = x^k.
//!
//! Not a complete algorithm on its own: anything that is not a prime power
//! comes back as an error. The sieve algorithms run it first, both as a
//! fast path and because a congruence of squares cannot split p^k.

use num_bigint::BigInt;
use num_traits::{One, Pow};
use rand::rngs::StdRng;

use crate::primes::PrimeTable;
use crate::FactorError;

/// If n == x^k for some prime exponent k, return k copies of x; otherwise
/// `NotPrimePower`. Requires n > 1.
pub fn factor(n: &BigInt, _rng: &mut StdRng) -> Result<Vec<BigInt>, FactorError> {
    let mut primes = PrimeTable::new();
    for i in 0.. {
        let p = primes.get(i);
        let x = n.nth_root(p as u32);
        if x <= BigInt::one() {
            return Err(FactorError::NotPrimePower(n.clone()));
        }
        if Pow::pow(&x, p as u32) == *n {
            return Ok(vec![x; p as usize]);
        }
    }
    unreachable!()
}
