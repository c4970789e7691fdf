//! Smoothness sieve for quadratic polynomial values.
//!
//! Given f(x) = a*x^2 + b*x + c and a factor base, find every x in a window
//! for which f(x) factors over the base, within one large-prime cofactor.
//! The sieve accumulates scaled logarithms of the factor-base prime powers
//! dividing f(x) into a byte array, one cache-sized window at a time; slots
//! that accumulate enough log weight are verified by trial division.

use std::collections::VecDeque;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use rand::rngs::StdRng;

use crate::arith;
use crate::modmath;

const WINDOW_BITS: u32 = 14;
/// Sieve array size in bytes; 16 KB keeps it inside L1.
pub const WINDOW: i64 = 1 << WINDOW_BITS;

/// One sieve hit: f(x) == product(factor base entries at `factors`) * remainder.
#[derive(Debug, Clone)]
pub struct SieveResult {
    pub x: BigInt,
    /// Indexes into the factor base, one entry per prime division.
    pub factors: Vec<usize>,
    /// 1 for fully smooth values, else a single prime below maxp^2.
    pub remainder: i64,
}

/// A prime-power line through the sieve: every `pk`-th slot starting at
/// `off` gains `logp`.
struct SieveTask {
    pk: i64,
    off: i64,
    logp: u8,
}

fn eval(a: &BigInt, b: &BigInt, c: &BigInt, x: &BigInt) -> BigInt {
    (a * x + b) * x + c
}

/// Find every x in [x0, x1) for which f(x) = a*x^2 + b*x + c is smooth over
/// `fb` within one large-prime cofactor below maxp^2. Also returns the
/// number of sieve false positives, for logging.
///
/// Requires fb[0] == -1, a > 0, and x0 <= x1.
pub fn smooth(
    a: &BigInt,
    b: &BigInt,
    c: &BigInt,
    fb: &[i64],
    x0: &BigInt,
    x1: &BigInt,
    rng: &mut StdRng,
) -> (Vec<SieveResult>, u64) {
    assert_eq!(fb[0], -1, "factor base must start with -1");
    assert!(a.is_positive(), "leading coefficient must be positive");
    assert!(x0 <= x1);

    let (results, false_positives) = smooth_range(a, b, c, fb, x0, x1, rng);

    // Every reported factorization must multiply back to f(x).
    for r in &results {
        let f = eval(a, b, c, &r.x);
        let mut g = BigInt::from(r.remainder);
        for &i in &r.factors {
            g *= fb[i];
        }
        assert_eq!(f, g, "sieve result does not factor f({})", r.x);
    }
    (results, false_positives)
}

fn smooth_range(
    a: &BigInt,
    b: &BigInt,
    c: &BigInt,
    fb: &[i64],
    x0: &BigInt,
    x1: &BigInt,
    rng: &mut StdRng,
) -> (Vec<SieveResult>, u64) {
    let maxp = *fb.last().unwrap();

    if x0 == x1 {
        return (Vec::new(), 0);
    }
    if &(x0 + 1) == x1 {
        // A single point: no sieving, just factor f(x0) directly.
        let mut f = eval(a, b, c, x0);
        if f.is_zero() {
            return (Vec::new(), 0);
        }
        let mut factors = Vec::new();
        for (i, &p) in fb.iter().enumerate() {
            if p == -1 {
                if f.is_negative() {
                    f = -f;
                    factors.push(i);
                }
                continue;
            }
            while arith::mod_i64(&f, p) == 0 {
                f = f / p;
                factors.push(i);
            }
        }
        if f <= BigInt::from(maxp) * maxp {
            if let Some(remainder) = f.to_i64() {
                return (
                    vec![SieveResult {
                        x: x0.clone(),
                        factors,
                        remainder,
                    }],
                    0,
                );
            }
        }
        return (Vec::new(), 0);
    }

    // Min and max of f over [x0, x1): one of the endpoints, or the value at
    // the extremum x = -b/2a when that lies inside the range.
    let y0 = eval(a, b, c, x0);
    let x1m1 = x1 - 1;
    let y1 = eval(a, b, c, &x1m1);
    let (mut min, mut max) = if y0 <= y1 {
        (y0.clone(), y1.clone())
    } else {
        (y1.clone(), y0.clone())
    };
    let extremum = -b.div_floor(&(a << 1));
    if extremum > *x0 && extremum < x1m1 {
        let y = eval(a, b, c, &extremum);
        if y < min {
            min = y.clone();
        }
        if y > max {
            max = y;
        }
    }

    if max.sign() != min.sign() {
        // f changes sign inside the range; split so each half has a tight
        // magnitude bound for the logarithm scaling.
        let mid = (x0 + x1) >> 1;
        let (mut r0, f0) = smooth_range(a, b, c, fb, x0, &mid, rng);
        let (r1, f1) = smooth_range(a, b, c, fb, &mid, x1, rng);
        r0.extend(r1);
        return (r0, f0 + f1);
    }

    let candidates = sieve_windows(a, b, c, fb, x0, x1, &min, &max, rng);

    // Verify candidates by trial division.
    let mut results = Vec::new();
    let mut false_positives: u64 = 0;
    let mut factors = Vec::new();
    for x in candidates {
        let mut f = eval(a, b, c, &x);
        if f.is_zero() {
            continue;
        }
        factors.clear();
        for (i, &p) in fb.iter().enumerate() {
            if p == -1 {
                if f.is_negative() {
                    f = -f;
                    factors.push(i);
                }
                continue;
            }
            while arith::mod_i64(&f, p) == 0 {
                f = f / p;
                factors.push(i);
            }
        }
        // A remainder above maxp^2 may be composite; the sieve slot lied.
        if f > BigInt::from(maxp) * maxp {
            false_positives += 1;
            continue;
        }
        let Some(remainder) = f.to_i64() else {
            continue;
        };
        results.push(SieveResult {
            x,
            factors: factors.clone(),
            remainder,
        });
        if results.len() >= 2 * fb.len() {
            // Plenty for the matrix already; stop early on small inputs.
            return (results, false_positives);
        }
    }
    (results, false_positives)
}

/// Sieve [x0, x1) one window at a time and return candidate x values whose
/// accumulated log weight crosses the threshold. min/max bound f over the
/// range and share one sign.
#[allow(clippy::too_many_arguments)]
fn sieve_windows(
    a: &BigInt,
    b: &BigInt,
    c: &BigInt,
    fb: &[i64],
    x0: &BigInt,
    x1: &BigInt,
    min: &BigInt,
    max: &BigInt,
    rng: &mut StdRng,
) -> Vec<BigInt> {
    // Scale logarithms so the largest possible |f(x)| maps just under 256;
    // sums of scaled prime logs for genuine divisors then cannot overflow a
    // byte.
    let bound = if max.sign() == Sign::Plus { max } else { min };
    let scale = 255.99 / arith::log(bound);

    let maxp = *fb.last().unwrap();
    let log_maxp = (maxp as f64).ln();

    // Small prime powers (< window) touch every window and stay in a flat
    // list. Larger ones are parked in a bucket per future window and only
    // visited when their window comes up.
    let mut small: Vec<SieveTask> = Vec::new();
    let buckets = ((maxp + WINDOW - 1) / WINDOW + 1) as usize;
    let mut large: VecDeque<Vec<SieveTask>> = (0..buckets).map(|_| Vec::new()).collect();

    for &p in &fb[1..] {
        if arith::mod_i64(a, p) == 0 {
            // In mpqs the polynomial's leading coefficient absorbs some
            // factor base primes; those never divide f(x)/a at sieveable
            // points, so skip them here. The driver adds them back.
            continue;
        }
        let logp = (scale * (p as f64).ln()) as u8;
        if logp == 0 {
            panic!("factor base too dense: scaled log of {} underflows", p);
        }
        let mut pk = p;
        let mut k: u32 = 1;
        // Use powers of p while p^k stays within the factor base bound.
        while pk <= maxp {
            let st = arith::mod_i64(x0, pk);
            let roots = modmath::quadratic_mod_pk(
                arith::mod_i64(a, pk),
                arith::mod_i64(b, pk),
                arith::mod_i64(c, pk),
                p,
                k,
                pk,
                rng,
            );
            for r in roots {
                // First slot at or past x0 on this residue line.
                let off = (r - st + pk) % pk;
                if pk < WINDOW {
                    small.push(SieveTask { pk, off, logp });
                } else {
                    let i = (off / WINDOW) as usize;
                    large[i].push(SieveTask {
                        pk,
                        off: off % WINDOW,
                        logp,
                    });
                }
            }
            pk *= p;
            k += 1;
        }
    }

    let mut sieve = vec![0u8; WINDOW as usize];
    let mut candidates = Vec::new();
    let mut x = x0.clone();

    while x < *x1 {
        sieve.fill(0);

        for task in &mut small {
            let mut off = task.off;
            while off < WINDOW {
                let slot = &mut sieve[off as usize];
                *slot = slot.saturating_add(task.logp);
                off += task.pk;
            }
            task.off = off - WINDOW;
        }

        let mut head = large.pop_front().unwrap();
        for task in head.drain(..) {
            let slot = &mut sieve[task.off as usize];
            *slot = slot.saturating_add(task.logp);
            // Re-file relative to the start of the next window.
            let next = task.off + task.pk - WINDOW;
            large[(next / WINDOW) as usize].push(SieveTask {
                pk: task.pk,
                off: next % WINDOW,
                logp: task.logp,
            });
        }
        large.push_back(head);

        // Threshold from the smaller endpoint magnitude of this window; the
        // 2*log(maxp) slack admits one large-prime cofactor below maxp^2.
        let y0 = eval(a, b, c, &x).abs();
        let z = &x + WINDOW;
        let y1 = eval(a, b, c, &z).abs();
        let ymin = y0.min(y1);
        let threshold = if ymin.is_zero() {
            0
        } else {
            let t = scale * (arith::log(&ymin) - 2.0 * log_maxp);
            if t <= 0.0 {
                0
            } else {
                t as u8
            }
        };

        for (i, &entry) in sieve.iter().enumerate() {
            if entry >= threshold {
                let cand = &x + i as i64;
                if cand < *x1 {
                    candidates.push(cand);
                }
            }
        }

        x += WINDOW;
    }
    candidates
}
