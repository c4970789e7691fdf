//! Trial division, the first fallback.

use num_bigint::BigInt;
use rand::rngs::StdRng;

use crate::arith;
use crate::primes::PrimeTable;
use crate::FactorError;

/// Divide by 2, 3, 5, 7, ... until a factor splits n. The driver only
/// passes composites, so a factor always exists.
pub fn factor(n: &BigInt, _rng: &mut StdRng) -> Result<Vec<BigInt>, FactorError> {
    let mut primes = PrimeTable::new();
    for i in 0.. {
        let p = primes.get(i);
        if arith::mod_i64(n, p) == 0 {
            return Ok(vec![BigInt::from(p), n / p]);
        }
    }
    unreachable!()
}
