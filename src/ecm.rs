//! Lenstra's elliptic curve method.
//!
//! Points on y^2 = x^3 + ax + 1 mod n form a group when n is prime; for
//! composite n the group law can fail, and each failure hands us a factor:
//! the slope denominator in point addition turns out to share a nontrivial
//! gcd with n. Point arithmetic therefore returns `Result<Point, BigInt>`,
//! with `Err` carrying the divisor of n that made an inversion impossible,
//! and the orchestrator converts that into a split.
//!
//! Starting from p = (0, 1) on a random curve, we multiply by successive
//! primes; if p reaches the identity the curve is abandoned and a new a is
//! drawn.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use tracing::debug;

use crate::arith;
use crate::primepower;
use crate::primes::PrimeTable;
use crate::FactorError;

/// A point on the curve, with (0, 0) reserved for the identity. (0, 0) is
/// never a solution of the curve equation, so the encoding is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: BigInt,
    pub y: BigInt,
}

impl Point {
    pub fn zero() -> Point {
        Point {
            x: BigInt::zero(),
            y: BigInt::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Whether the point satisfies y^2 == x^3 + ax + 1 mod n.
    pub fn on_curve(&self, n: &BigInt, a: &BigInt) -> bool {
        if self.is_zero() {
            return true;
        }
        let lhs = &self.y * &self.y;
        let rhs = (&self.x * &self.x + a) * &self.x + 1i32;
        (lhs - rhs).mod_floor(n).is_zero()
    }

    /// Group addition mod n. `Err(g)` reports a nontrivial divisor g of n
    /// discovered when a slope denominator was not invertible.
    pub fn add(&self, q: &Point, n: &BigInt, a: &BigInt) -> Result<Point, BigInt> {
        if self.is_zero() {
            return Ok(q.clone());
        }
        if q.is_zero() {
            return Ok(self.clone());
        }
        let (num, denom) = if self.x != q.x {
            (&self.y - &q.y, &self.x - &q.x)
        } else if self.y == q.y && !self.y.is_zero() {
            // Tangent slope for doubling.
            ((&self.x * &self.x) * 3 + a, &self.y << 1)
        } else {
            // p == -q
            return Ok(Point::zero());
        };
        let denom = denom.mod_floor(n);
        let g = denom.gcd(n);
        if !g.is_one() {
            // For odd n this g is a proper divisor: distinct reduced x
            // coordinates leave the denominator nonzero mod n, and a
            // doubling denominator 2y with 0 < y < n is never divisible
            // by an odd n.
            return Err(g);
        }
        let s = (num * arith::mod_inv(&denom, n).unwrap()).mod_floor(n);
        let rx = (&s * &s - &self.x - &q.x).mod_floor(n);
        let ry = (s * (&self.x - &rx) - &self.y).mod_floor(n);
        Ok(Point { x: rx, y: ry })
    }

    /// k * self by double-and-add. k >= 1.
    pub fn mul(&self, k: i64, n: &BigInt, a: &BigInt) -> Result<Point, BigInt> {
        let mut p = self.clone();
        let mut q = Point::zero();
        let mut k = k;
        while k > 1 {
            if k & 1 != 0 {
                q = q.add(&p, n, a)?;
            }
            p = p.add(&p, n, a)?;
            k >>= 1;
        }
        q.add(&p, n, a)
    }
}

/// Factor n by trying random curves until one of them trips over a divisor.
pub fn factor(n: &BigInt, rng: &mut StdRng) -> Result<Vec<BigInt>, FactorError> {
    // A congruence-free prime power would keep every curve honest; handle
    // it up front.
    if let Ok(parts) = primepower::factor(n, rng) {
        return Ok(parts);
    }

    let mut primes = PrimeTable::new();
    let mut curves: u64 = 0;
    loop {
        let a = arith::random_below(n, rng);
        // 4a^3 + 27 == 0 mod n means the curve is singular; skip it.
        if (((&a * &a * &a) << 2i32) + 27i32).mod_floor(n).is_zero() {
            continue;
        }
        curves += 1;

        let mut p = Point {
            x: BigInt::zero(),
            y: BigInt::one(),
        };
        for i in 0.. {
            match p.mul(primes.get(i), n, &a) {
                Ok(q) if q.is_zero() => {
                    // Reached the identity without a failure; new curve.
                    debug!(curves, "curve exhausted");
                    break;
                }
                Ok(q) => p = q,
                Err(g) => {
                    let other = n / &g;
                    return Ok(vec![g, other]);
                }
            }
        }
    }
}
