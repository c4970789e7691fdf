//! Relation bookkeeping between the sieve and the linear algebra.
//!
//! Both quadratic sieve variants funnel their hits through the same path:
//! partial relations wait in a large-prime table until a second hit with the
//! same cofactor pairs them off, completed relations feed the GF(2) matrix,
//! and a reported dependency is turned into a congruence of squares and a
//! factor of n.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;
use tracing::debug;

use crate::arith;
use crate::matrix::Gf2Matrix;
use crate::modmath;
use crate::primes::PrimeTable;

/// x^2 == product(factor base entries at `factors`) mod n.
#[derive(Debug, Clone)]
pub struct Relation {
    pub x: BigInt,
    pub factors: Vec<usize>,
}

/// Build the factor base for n: -1 followed by every prime p <= bound for
/// which n is a quadratic residue mod p. If some prime divides n, the scan
/// stops and that prime is returned instead (second value nonzero).
pub fn factor_base(n: &BigInt, bound: i64) -> (Vec<i64>, i64) {
    let mut primes = PrimeTable::new();
    let mut fb = vec![-1i64];
    for i in 0.. {
        let p = primes.get(i);
        if p > bound {
            return (fb, 0);
        }
        let a = arith::mod_i64(n, p);
        if a == 0 {
            return (Vec::new(), p);
        }
        if modmath::quadratic_residue(a, p) {
            // If x^2 == n mod p has no solution, p never divides x^2 - n
            // and has no business in the factor base.
            fb.push(p);
        }
    }
    unreachable!()
}

/// Accumulates relations for one modulus until a dependency splits it.
pub struct RelationSet {
    n: BigInt,
    fb: Vec<i64>,
    matrix: Gf2Matrix<Relation>,
    partials: HashMap<i64, Relation>,
}

impl RelationSet {
    pub fn new(n: &BigInt, fb: &[i64]) -> Self {
        RelationSet {
            n: n.clone(),
            fb: fb.to_vec(),
            matrix: Gf2Matrix::new(fb.len()),
            partials: HashMap::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Feed one sieve result through large-prime pairing and the matrix.
    /// Returns a nontrivial split of n once a usable dependency appears.
    pub fn add(
        &mut self,
        x: BigInt,
        mut factors: Vec<usize>,
        remainder: i64,
    ) -> Option<(BigInt, BigInt)> {
        let x = if remainder != 1 {
            if let Some(earlier) = self.partials.get(&remainder) {
                // x1^2 == prod(f1) * q and x2^2 == prod(f2) * q, so
                // (x1 * x2 / q)^2 == prod(f1) * prod(f2).
                let q = BigInt::from(remainder);
                let Some(inv) = arith::mod_inv(&q, &self.n) else {
                    // The cofactor shares a factor with n; take it.
                    let g = q.gcd(&self.n);
                    let other = &self.n / &g;
                    return Some((g, other));
                };
                factors.extend_from_slice(&earlier.factors);
                (x * &earlier.x).mod_floor(&self.n) * inv % &self.n
            } else {
                // First sighting of this cofactor; park the relation.
                self.partials.insert(remainder, Relation { x, factors });
                return None;
            }
        } else {
            x
        };

        let relation = Relation {
            x: x.clone(),
            factors: factors.clone(),
        };
        match self.matrix.add_row(&factors, relation) {
            None => {
                if self.matrix.rows() % 100 == 0 {
                    debug!(
                        rows = self.matrix.rows(),
                        base = self.fb.len(),
                        partials = self.partials.len(),
                        "matrix progress"
                    );
                }
                None
            }
            Some(dependency) => self.extract(&dependency),
        }
    }

    /// Turn a dependency into a^2 == b^2 mod n and, unless trivial, into a
    /// factor of n.
    fn extract(&self, dependency: &[Relation]) -> Option<(BigInt, BigInt)> {
        let mut a = BigInt::one();
        let mut b = BigInt::one();
        let mut odd = vec![false; self.fb.len()];
        for relation in dependency {
            a = (a * &relation.x).mod_floor(&self.n);
            for &i in &relation.factors {
                if !odd[i] {
                    odd[i] = true;
                } else {
                    // Second occurrence completes a square; one copy of the
                    // prime goes into b.
                    b = (b * self.fb[i]).mod_floor(&self.n);
                    odd[i] = false;
                }
            }
        }
        assert!(
            odd.iter().all(|&o| !o),
            "dependency left an odd factor multiplicity"
        );

        if a == b {
            debug!("trivial dependency: equal roots");
            return None;
        }
        if &a + &b == self.n {
            debug!("trivial dependency: opposite roots");
            return None;
        }
        let f = (a + b).gcd(&self.n);
        let other = &self.n / &f;
        Some((f, other))
    }
}
