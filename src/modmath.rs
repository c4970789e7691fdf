//! Modular arithmetic over 64-bit operands.
//!
//! Unless a function says otherwise, arguments must be below 2^31 so that
//! products of the form a*x + b*y stay inside an i64. The square-root
//! routines are the number-theoretic machinery behind the sieve: they find
//! the residues where a quadratic polynomial vanishes modulo a prime power.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

use crate::arith;

/// x^e mod p.
pub fn exp_mod(x: i64, e: i64, p: i64) -> i64 {
    let mut r: i64 = 1;
    let mut x = x % p;
    let mut e = e;
    while e != 0 {
        if e & 1 != 0 {
            r = r * x % p;
        }
        x = x * x % p;
        e >>= 1;
    }
    r
}

/// Greatest common divisor of x and y. x >= 0, y >= 0, not both zero.
pub fn gcd(x: i64, y: i64) -> i64 {
    let (mut x, mut y) = if x < y { (y, x) } else { (x, y) };
    loop {
        if y == 0 {
            return x;
        }
        let t = y;
        y = x % y;
        x = t;
    }
}

/// y with x*y == 1 mod n. Panics when gcd(x, n) != 1.
pub fn mod_inv(x: i64, n: i64) -> i64 {
    let mut t: i64 = 0;
    let mut newt: i64 = 1;
    let mut r = n;
    let mut newr = x;
    while newr != 0 {
        let q = r / newr;
        (t, newt) = (newt, t - q * newt);
        (r, newr) = (newr, r - q * newr);
    }
    if r > 1 {
        panic!("{} is not invertible mod {}", x, n);
    }
    if t < 0 {
        t += n;
    }
    t
}

/// True iff x^2 == n mod p has a solution. p must be prime, 0 <= n < p.
pub fn quadratic_residue(n: i64, p: i64) -> bool {
    if n < 2 {
        return true;
    }
    // Euler's criterion: n is a residue iff n^((p-1)/2) == 1 mod p.
    exp_mod(n, p >> 1, p) == 1
}

/// An x with x^2 == n mod p, the smaller of the two roots.
///
/// p must be prime, 0 <= n < p, and n must be a quadratic residue mod p.
/// For p == 3 mod 4 the root is n^((p+1)/4); otherwise Cipolla's algorithm
/// in F_p[sqrt(w)] for a random non-residue w = a^2 - n.
pub fn sqrt_mod_p(n: i64, p: i64, rng: &mut impl Rng) -> i64 {
    if n < 2 {
        return n;
    }
    if p % 4 == 3 {
        let r = exp_mod(n, (p + 1) >> 2, p);
        return r.min(p - r);
    }

    let (a, w) = loop {
        let a = 1 + rng.gen_range(0..p - 1);
        let w = (a * a + p - n) % p;
        if !quadratic_residue(w, p) {
            break (a, w);
        }
    };

    // (a + sqrt(w))^((p+1)/2) lands in the base field and squares to n.
    let mut x0 = a;
    let mut x1: i64 = 1;
    let mut r0: i64 = 1;
    let mut r1: i64 = 0;
    let mut q = (p + 1) >> 1;
    while q != 0 {
        if q & 1 != 0 {
            (r0, r1) = ((r0 * x0 + r1 * x1 % p * w) % p, (r0 * x1 + r1 * x0) % p);
        }
        (x0, x1) = ((x0 * x0 + x1 * x1 % p * w) % p, 2 * x0 * x1 % p);
        q >>= 1;
    }
    assert!(r1 == 0, "cipolla result not in the base field");
    r0.min(p - r0)
}

/// An x with x^2 == n mod p^k.
///
/// p must be prime, k >= 1, 0 <= n < p^k, and when n != 0, p must not
/// divide n. n must be a quadratic residue mod p. Intermediates are widened
/// to i128, so p^k may range up to 2^62.
pub fn sqrt_mod_pk(n: i64, p: i64, k: u32, rng: &mut impl Rng) -> i64 {
    if n < 2 {
        return n;
    }
    if p == 2 {
        // No Hensel step at 2: track the full set of roots one bit at a
        // time, doubling the candidate set at each new bit.
        let mut roots: Vec<i64> = vec![0];
        let mut mask: i64 = 1;
        for b in 0..k {
            let mut next = Vec::new();
            for &v in &roots {
                if (v * v) & mask == n & mask {
                    next.push(v);
                }
                let w = v + (1 << b);
                if (w * w) & mask == n & mask {
                    next.push(w);
                }
            }
            mask = 2 * mask + 1;
            roots = next;
        }
        return roots[0];
    }

    // Root mod p, then Hensel-lift one power at a time:
    // r' = r + p^i * ((n - r^2)/p^i) * (2r)^-1 mod p.
    let mut r = sqrt_mod_p(n % p, p, rng);
    let mut pi = p;
    for _ in 1..k {
        let t = ((n as i128 + (pi as i128 * p as i128 - r as i128) * r as i128) / pi as i128
            % p as i128) as i64;
        let t = t * mod_inv((2 * r) % p, p) % p;
        r += t * pi;
        pi *= p;
    }
    r
}

/// A prime power p^k appearing in a composite modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimePower {
    pub p: i64,
    pub k: u32,
}

impl PrimePower {
    fn value(&self) -> i64 {
        let mut pk: i64 = 1;
        for _ in 0..self.k {
            pk *= self.p;
        }
        pk
    }
}

/// A solution to x^2 == a mod N, where N is the product of the listed prime
/// powers. gcd(a, N) == 1, and a must be a quadratic residue mod each prime.
/// Panics when the recombined root fails to square back to a.
pub fn sqrt_mod_n(a: i64, pps: &[PrimePower], rng: &mut impl Rng) -> i64 {
    if a <= 1 {
        return a;
    }
    let mut n: i64 = 1;
    for pp in pps {
        n *= pp.value();
    }

    // Chinese remainder: one residue per prime power.
    let mut r: i64 = 0;
    for pp in pps {
        let pk = pp.value();
        let x = sqrt_mod_pk(a % pk, pp.p, pp.k, rng);
        let m = n / pk;
        let inv = mod_inv(m % pk, pk);
        let term = m as i128 * x as i128 % n as i128 * inv as i128 % n as i128;
        r = ((r as i128 + term) % n as i128) as i64;
    }
    assert!(
        (r as i128 * r as i128 % n as i128) as i64 == a % n,
        "modular square root verification failed"
    );
    r
}

/// `sqrt_mod_n` for a modulus too large for i64: a solution to
/// x^2 == a mod N with N the product of the prime powers. Each individual
/// p^k must still fit an i64.
pub fn big_sqrt_mod_n(a: &BigInt, pps: &[PrimePower], rng: &mut impl Rng) -> BigInt {
    if *a <= BigInt::one() {
        return a.clone();
    }
    let mut n = BigInt::one();
    for pp in pps {
        n *= pp.value();
    }

    let mut r = BigInt::zero();
    for pp in pps {
        let pk = pp.value();
        let x = sqrt_mod_pk(arith::mod_i64(a, pk), pp.p, pp.k, rng);
        let m = &n / pk;
        let inv = mod_inv(arith::mod_i64(&m, pk), pk);
        r = (r + m * x * inv).mod_floor(&n);
    }
    assert!(
        (&r * &r).mod_floor(&n) == *a,
        "modular square root verification failed"
    );
    r
}

/// All x in [0, p^k) with a*x^2 + b*x + c == 0 mod p^k.
///
/// 0 <= a, b, c < p^k, gcd(a, p) == 1, and pk == p^k. For p == 2 only
/// k == 1 is supported; higher powers of two return no roots. For odd p,
/// a discriminant divisible by p also returns no roots even though
/// solutions may exist.
pub fn quadratic_mod_pk(
    a: i64,
    b: i64,
    c: i64,
    p: i64,
    k: u32,
    pk: i64,
    rng: &mut impl Rng,
) -> Vec<i64> {
    if p == 2 {
        if k > 1 {
            return Vec::new();
        }
        // 2 is not a unit mod 2, so the 1/2a formula breaks down; the two
        // candidates can just be checked directly.
        return (0..2).filter(|&x| (a * x * x + b * x + c) % 2 == 0).collect();
    }

    let d = (b * b % pk + 4 * (pk - a) % pk * c % pk) % pk;
    let e = d % p;
    if e == 0 || !quadratic_residue(e, p) {
        return Vec::new();
    }
    let d = sqrt_mod_pk(d, p, k, rng);
    let inv = mod_inv(2 * a % pk, pk);
    // x = (-b +- sqrt(d)) / 2a
    let mut roots = vec![(pk - b + d) % pk * inv % pk];
    if d != 0 {
        roots.push((2 * pk - b - d) % pk * inv % pk);
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::PrimeTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exp_mod() {
        assert_eq!(exp_mod(2, 10, 1000), 24);
        assert_eq!(exp_mod(3, 0, 7), 1);
        for p in [5i64, 7, 11, 13] {
            for x in 1..p {
                // Fermat: x^(p-1) == 1 mod p
                assert_eq!(exp_mod(x, p - 1, p), 1);
            }
        }
    }

    #[test]
    fn test_gcd() {
        for x in 0i64..60 {
            for y in 0i64..60 {
                if x == 0 && y == 0 {
                    continue;
                }
                let mut want = 1;
                for z in 1..=60 {
                    if x % z == 0 && y % z == 0 {
                        want = z;
                    }
                }
                assert_eq!(gcd(x, y), want, "gcd({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_mod_inv() {
        for n in 2i64..200 {
            for x in 1..n {
                if gcd(x, n) != 1 {
                    continue;
                }
                let y = mod_inv(x, n);
                assert_eq!(x * y % n, 1, "mod_inv({}, {})", x, n);
            }
        }
    }

    #[test]
    #[should_panic(expected = "not invertible")]
    fn test_mod_inv_non_unit() {
        mod_inv(6, 9);
    }

    #[test]
    fn test_quadratic_residue() {
        let mut primes = PrimeTable::new();
        for i in 0..40 {
            let p = primes.get(i);
            let mut squares = std::collections::HashSet::new();
            for a in 0..p {
                squares.insert(a * a % p);
            }
            for a in 0..p {
                assert_eq!(
                    quadratic_residue(a, p),
                    squares.contains(&a),
                    "p={} a={}",
                    p,
                    a
                );
            }
        }
    }

    #[test]
    fn test_sqrt_mod_p() {
        let mut rng = StdRng::seed_from_u64(123);
        let mut primes = PrimeTable::new();
        // Covers both the p == 3 mod 4 shortcut and Cipolla (p == 1 mod 4).
        for i in 0..60 {
            let p = primes.get(i);
            for x in 0..p {
                let a = x * x % p;
                let r = sqrt_mod_p(a, p, &mut rng);
                assert_eq!(r * r % p, a, "p={} a={}", p, a);
                assert!(r <= p - r || r < 2, "p={} a={} root {} not minimal", p, a, r);
            }
        }
    }

    #[test]
    fn test_sqrt_mod_pk() {
        let mut rng = StdRng::seed_from_u64(123);
        let mut primes = PrimeTable::new();
        for i in 0..12 {
            let p = primes.get(i);
            let mut pk = p;
            let mut k = 1;
            while pk <= 3000 {
                // All roots mod p^k, by enumeration.
                let mut roots: std::collections::HashMap<i64, Vec<i64>> =
                    std::collections::HashMap::new();
                for a in 0..pk {
                    roots.entry(a * a % pk).or_default().push(a);
                }
                for a in 0..pk {
                    if a != 0 && gcd(a, pk) != 1 {
                        continue;
                    }
                    let Some(want) = roots.get(&a) else { continue };
                    let r = sqrt_mod_pk(a, p, k, &mut rng);
                    assert!(
                        want.contains(&r),
                        "pk={} a={} got {}, want one of {:?}",
                        pk,
                        a,
                        r,
                        want
                    );
                }
                pk *= p;
                k += 1;
            }
        }
    }

    #[test]
    fn test_sqrt_mod_n() {
        let mut rng = StdRng::seed_from_u64(5);
        let pps = [PrimePower { p: 3, k: 2 }, PrimePower { p: 5, k: 1 }];
        let n = 45i64;
        for x in 1..n {
            if gcd(x, n) != 1 {
                continue;
            }
            let a = x * x % n;
            let r = sqrt_mod_n(a, &pps, &mut rng);
            assert_eq!(r * r % n, a, "a={}", a);
        }
    }

    #[test]
    fn test_big_sqrt_mod_n() {
        let mut rng = StdRng::seed_from_u64(5);
        let pps = [
            PrimePower { p: 7, k: 1 },
            PrimePower { p: 11, k: 1 },
            PrimePower { p: 13, k: 1 },
        ];
        let n = BigInt::from(7 * 11 * 13);
        for x in [2i64, 10, 100, 500, 999] {
            if gcd(x, 7 * 11 * 13) != 1 {
                continue;
            }
            let a = BigInt::from(x * x).mod_floor(&n);
            let r = big_sqrt_mod_n(&a, &pps, &mut rng);
            assert_eq!((&r * &r).mod_floor(&n), a, "x={}", x);
        }
    }

    #[test]
    fn test_quadratic_mod_2() {
        let mut rng = StdRng::seed_from_u64(9);
        // All four parity combinations of (a, b), both c parities.
        for a in 0..2 {
            for b in 0..2 {
                for c in 0..2 {
                    let got = quadratic_mod_pk(a, b, c, 2, 1, 2, &mut rng);
                    let want: Vec<i64> = (0..2)
                        .filter(|&x| (a * x * x + b * x + c) % 2 == 0)
                        .collect();
                    assert_eq!(got, want, "a={} b={} c={}", a, b, c);
                }
            }
        }
        // Powers of two beyond the first are unsupported.
        assert!(quadratic_mod_pk(1, 0, 0, 2, 2, 4, &mut rng).is_empty());
    }

    #[test]
    fn test_quadratic_mod_pk() {
        let mut rng = StdRng::seed_from_u64(9);
        for &(p, k) in &[(3i64, 1u32), (5, 1), (7, 1), (3, 2), (5, 2), (7, 2), (3, 3)] {
            let pk = (0..k).fold(1i64, |acc, _| acc * p);
            for a in 1..pk.min(20) {
                if gcd(a, p) != 1 {
                    continue;
                }
                for b in 0..pk.min(20) {
                    for c in 0..pk.min(20) {
                        let got = quadratic_mod_pk(a, b, c, p, k, pk, &mut rng);
                        // Every returned root must be a solution.
                        for &x in &got {
                            assert_eq!(
                                (a * x % pk * x + b * x + c) % pk,
                                0,
                                "p^k={} a={} b={} c={} x={}",
                                pk,
                                a,
                                b,
                                c,
                                x
                            );
                        }
                        // When the discriminant is a unit, the count must
                        // match brute force.
                        let d = (b * b % pk + 4 * (pk - a) % pk * c % pk) % pk;
                        if d % p != 0 {
                            let want = (0..pk)
                                .filter(|&x| (a * x % pk * x + b * x + c) % pk == 0)
                                .count();
                            assert_eq!(
                                got.len(),
                                want,
                                "p^k={} a={} b={} c={}",
                                pk,
                                a,
                                b,
                                c
                            );
                        }
                    }
                }
            }
        }
    }
}
