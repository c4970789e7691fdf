//! Big-integer helpers shared by the factoring algorithms.
//!
//! `num_bigint::BigInt` is the value type throughout the crate; this module
//! adds the handful of operations the sieve pipeline needs that the num
//! crates spell differently or lack: allocation-free small-modulus
//! reduction, floor/ceil square roots, a float logarithm, modular inverses,
//! and Miller-Rabin primality.

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive};
use rand::Rng;

/// Euclidean remainder of `x` against a small positive modulus, always in
/// `[0, m)`.
///
/// Folds the magnitude's 64-bit digits instead of going through a BigInt
/// division, so the sieve inner loop can reduce against factor-base primes
/// without allocating.
pub fn mod_i64(x: &BigInt, m: i64) -> i64 {
    assert!(m > 0, "mod_i64 requires a positive modulus");
    let m = m as u64;
    // 2^64 mod m, for stepping the digit weight.
    let base = ((u64::MAX as u128 + 1) % m as u128) as u64;
    let mut r: u64 = 0;
    let mut weight: u64 = 1; // (2^64)^i mod m
    for d in x.magnitude().iter_u64_digits() {
        let term = (d as u128 % m as u128) * weight as u128 % m as u128;
        r = ((r as u128 + term) % m as u128) as u64;
        weight = (weight as u128 * base as u128 % m as u128) as u64;
    }
    let mut r = r as i64;
    if x.sign() == Sign::Minus && r != 0 {
        r = m as i64 - r;
    }
    r
}

/// Largest y with y*y <= x. Panics on negative input.
pub fn sqrt_floor(x: &BigInt) -> BigInt {
    assert!(!x.is_negative(), "sqrt_floor of a negative number");
    x.sqrt()
}

/// Smallest y with y*y >= x; sqrt_ceil(0) == 0.
pub fn sqrt_ceil(x: &BigInt) -> BigInt {
    let y = sqrt_floor(x);
    if &y * &y == *x {
        y
    } else {
        y + 1
    }
}

/// Natural logarithm of |x| as an f64. x must be nonzero.
///
/// Values wider than 64 bits are split into a 64-bit mantissa and a power
/// of two, so the result stays finite far beyond f64 range.
pub fn log(x: &BigInt) -> f64 {
    let m = x.magnitude();
    let bits = m.bits();
    assert!(bits > 0, "log of zero");
    if bits <= 64 {
        return (m.to_u64().unwrap() as f64).ln();
    }
    let shift = bits - 64;
    let top = (m >> shift).to_u64().unwrap();
    (top as f64).ln() + shift as f64 * std::f64::consts::LN_2
}

/// Modular inverse of x mod n, or None when gcd(x, n) != 1.
pub fn mod_inv(x: &BigInt, n: &BigInt) -> Option<BigInt> {
    let e = x.extended_gcd(n);
    if !e.gcd.is_one() {
        return None;
    }
    Some(e.x.mod_floor(n))
}

/// A value in [0, bound), uniform up to the bias of reducing an oversized
/// random byte string. bound must be positive.
pub fn random_below(bound: &BigInt, rng: &mut impl Rng) -> BigInt {
    assert!(bound.is_positive(), "random_below requires a positive bound");
    // Eight extra bytes keep the reduction bias negligible.
    let len = (bound.bits() as usize + 7) / 8 + 8;
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    BigInt::from_bytes_be(Sign::Plus, &bytes) % bound
}

/// Miller-Rabin probabilistic primality test with `rounds` random bases.
pub fn is_probably_prime(n: &BigInt, rounds: u32, rng: &mut impl Rng) -> bool {
    let two = BigInt::from(2);
    if *n < two {
        return false;
    }
    if *n == two || *n == BigInt::from(3) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // n-1 = 2^r * d with d odd
    let n_minus_1 = n - 1i32;
    let mut d = n_minus_1.clone();
    let mut r: u32 = 0;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = random_below(&(n - 3i32), rng) + 2i32; // a in [2, n-2]
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r - 1 {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
