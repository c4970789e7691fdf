//! Multiple polynomial quadratic sieve.
//!
//! Instead of one polynomial x^2 - n, sieve many: f(x) = (ax + b)^2 - n
//! with a a product of factor-base primes and b^2 == n mod a, so that
//! f(x) = a * (ax^2 + 2bx + c) with c = (b^2 - n)/a. Every worker thread
//! draws polynomials and sieves them independently; the driver consumes
//! worker results strictly in task order, so for a fixed seed the relation
//! stream, and therefore the factor found, is identical regardless of
//! thread scheduling.
//!
//! The coefficient a is kept near 2*sqrt(n)/sieverange: any larger and
//! f(x0 + m)/a grows linearly with a over the sieved stretch.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Mutex;
use std::thread;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::arith;
use crate::modmath::{self, PrimePower};
use crate::primepower;
use crate::relations::{factor_base, RelationSet};
use crate::sieve::{self, SieveResult};
use crate::FactorError;

/// Sieving parameters, tiered by the bit length of n.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Factor base primes run up to this bound.
    pub fb_bound: i64,
    /// Width of the sieved stretch per polynomial.
    pub sieve_range: i64,
}

impl Params {
    pub fn for_bits(bits: u64) -> Self {
        if bits <= 48 {
            Params {
                fb_bound: 6_000,
                sieve_range: 1 << 18,
            }
        } else if bits <= 64 {
            Params {
                fb_bound: 12_000,
                sieve_range: 1 << 20,
            }
        } else if bits <= 96 {
            Params {
                fb_bound: 30_000,
                sieve_range: 1 << 22,
            }
        } else if bits <= 128 {
            Params {
                fb_bound: 50_000,
                sieve_range: 1 << 24,
            }
        } else {
            Params {
                fb_bound: 50_000,
                sieve_range: 1 << 26,
            }
        }
    }
}

struct Task {
    id: u64,
    seed: u64,
}

struct TaskResult {
    id: u64,
    results: Vec<SieveResult>,
    false_positives: u64,
}

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
    let maxp = *fb.last().unwrap();

    // Largest useful a, and the point where workers stop accumulating
    // factors into it. Slightly undershooting amax is fine; the floor of 2
    // keeps distinct tasks on distinct polynomials even for small n.
    let amax: BigInt = (arith::sqrt_ceil(n) << 1i32) / params.sieve_range;
    let amin: BigInt = (&amax / maxp).max(BigInt::from(2));
    info!(base = fb.len(), %amin, %amax, "factor base and coefficient range");

    let workers = num_cpus::get();
    info!(workers, "starting sieve workers");

    let (task_tx, task_rx) = std::sync::mpsc::sync_channel::<Task>(workers + 1);
    let (result_tx, result_rx) = std::sync::mpsc::sync_channel::<TaskResult>(workers + 1);
    let task_rx = Mutex::new(task_rx);

    let mut relations = RelationSet::new(n, &fb);

    let (f, g) = thread::scope(|scope| {
        for _ in 0..workers {
            let result_tx = result_tx.clone();
            let task_rx = &task_rx;
            let fb = &fb;
            let amin = &amin;
            let sieve_range = params.sieve_range;
            scope.spawn(move || worker(n, amin, fb, sieve_range, task_rx, result_tx));
        }
        drop(result_tx);

        let mut id: u64 = 0;
        for _ in 0..workers + 1 {
            task_tx
                .send(Task {
                    id,
                    seed: rng.gen(),
                })
                .expect("workers gone before first task");
            id += 1;
        }

        // Results are recorded as they arrive but consumed in task order,
        // so the relation stream is reproducible for a fixed seed.
        let mut pending: HashMap<u64, TaskResult> = HashMap::new();
        let mut next: u64 = 0;
        let mut false_positives: u64 = 0;
        let split = 'driver: loop {
            let res = result_rx.recv().expect("all workers exited");
            // Keep the pipeline full.
            task_tx
                .send(Task {
                    id,
                    seed: rng.gen(),
                })
                .expect("workers gone");
            id += 1;

            pending.insert(res.id, res);
            while let Some(res) = pending.remove(&next) {
                next += 1;
                false_positives += res.false_positives;
                if next % 100 == 0 {
                    debug!(
                        tasks = next,
                        rows = relations.rows(),
                        partials = relations.partial_count(),
                        false_positives,
                        "mpqs progress"
                    );
                }
                for r in res.results {
                    if let Some(split) = relations.add(r.x, r.factors, r.remainder) {
                        break 'driver split;
                    }
                }
            }
        };

        // Closing the channels tells every worker to exit; the scope joins
        // them on the way out.
        drop(task_tx);
        drop(result_rx);
        split
    });

    info!(factor = %f, "mpqs split found");
    Ok(vec![f, g])
}

fn worker(
    n: &BigInt,
    amin: &BigInt,
    fb: &[i64],
    sieve_range: i64,
    tasks: &Mutex<Receiver<Task>>,
    results: SyncSender<TaskResult>,
) {
    loop {
        let task = {
            let rx = tasks.lock().unwrap();
            match rx.recv() {
                Ok(t) => t,
                Err(_) => return,
            }
        };
        let mut rng = StdRng::seed_from_u64(task.seed);

        // a = the product of a random subset of factor base primes, just
        // past amin. Keeping a squarefree means every square root below is
        // a plain root mod p, with no lifting past the first power.
        let mut chosen: Vec<usize> = Vec::new();
        let mut a = BigInt::one();
        while a < *amin {
            let i = rng.gen_range(1..fb.len());
            if chosen.contains(&i) {
                continue;
            }
            chosen.push(i);
            a *= fb[i];
        }
        // Sorted for a deterministic CRT and factor list.
        chosen.sort_unstable();
        let prime_powers: Vec<PrimePower> = chosen
            .iter()
            .map(|&i| PrimePower { p: fb[i], k: 1 })
            .collect();

        // b^2 == n mod a makes c = (b^2 - n)/a exact.
        let b = modmath::big_sqrt_mod_n(&n.mod_floor(&a), &prime_powers, &mut rng);
        let c = (&b * &b - n) / &a;

        // f is smallest around x0 = (sqrt(n) - b)/a.
        let x0 = (arith::sqrt_ceil(n) - &b).div_floor(&a);
        let lo = &x0 - sieve_range / 2;
        let hi = &x0 + sieve_range / 2;
        let (hits, false_positives) = sieve::smooth(&a, &(&b << 1), &c, fb, &lo, &hi, &mut rng);

        // Rewrite each hit as a relation mod n:
        // (a*x + b)^2 == a * f(x) mod n, so fold a's factors back in.
        let mut out = Vec::with_capacity(hits.len());
        for mut r in hits {
            r.x = &a * &r.x + &b;
            r.factors.extend_from_slice(&chosen);
            out.push(r);
        }

        let sent = results.send(TaskResult {
            id: task.id,
            results: out,
            false_positives,
        });
        if sent.is_err() {
            // Driver is gone; nothing left to do.
            return;
        }
    }
}
