//! Single-polynomial quadratic sieve.
//!
//! Sieve f(x) = x^2 - n for smooth values, starting at ceil(sqrt(n)) where
//! f is smallest, one sieve-range stretch at a time. Each x with smooth
//! f(x) yields the relation x^2 == prod(factors) mod n; enough relations
//! force a GF(2) dependency and a congruence of squares.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use tracing::debug;

use crate::arith;
use crate::mpqs::Params;
use crate::primepower;
use crate::relations::{factor_base, RelationSet};
use crate::sieve;
use crate::FactorError;

pub fn factor(n: &BigInt, rng: &mut StdRng) -> Result<Vec<BigInt>, FactorError> {
    // A congruence of squares cannot split p^k; test for that first.
    if let Ok(parts) = primepower::factor(n, rng) {
        return Ok(parts);
    }

    let params = Params::for_bits(n.bits());
    let (fb, divisor) = factor_base(n, params.fb_bound);
    if divisor != 0 {
        return Ok(vec![BigInt::from(divisor), n / divisor]);
    }
    debug!(base = fb.len(), maxp = fb[fb.len() - 1], "factor base built");

    let a = BigInt::one();
    let b = BigInt::zero();
    let c = -n;
    let mut relations = RelationSet::new(n, &fb);

    let mut x0 = arith::sqrt_ceil(n);
    loop {
        let x1 = &x0 + params.sieve_range;
        let (results, false_positives) = sieve::smooth(&a, &b, &c, &fb, &x0, &x1, rng);
        debug!(
            hits = results.len(),
            false_positives,
            from = %x0,
            "sieve stretch done"
        );
        for r in results {
            if let Some((f, g)) = relations.add(r.x, r.factors, r.remainder) {
                return Ok(vec![f, g]);
            }
        }
        x0 = x1;
    }
}
