//! A growing table of primes.
//!
//! The factoring algorithms enumerate primes by index without knowing in
//! advance how far they will need to go; the table re-sieves with a doubled
//! bound whenever an index past the cached range is requested.

pub struct PrimeTable {
    primes: Vec<i64>,
    limit: i64,
}

impl PrimeTable {
    pub fn new() -> Self {
        let mut table = PrimeTable {
            primes: Vec::new(),
            limit: 0,
        };
        table.grow_to(1 << 16);
        table
    }

    /// The i-th prime, 0-indexed: get(0) == 2, get(1) == 3, ...
    pub fn get(&mut self, i: usize) -> i64 {
        while i >= self.primes.len() {
            self.grow_to(self.limit * 2);
        }
        self.primes[i]
    }

    /// Sieve of Eratosthenes up to `limit`, replacing the cached table.
    fn grow_to(&mut self, limit: i64) {
        let size = limit as usize + 1;
        let mut composite = vec![false; size];
        let mut p = 2usize;
        while p * p < size {
            if !composite[p] {
                let mut multiple = p * p;
                while multiple < size {
                    composite[multiple] = true;
                    multiple += p;
                }
            }
            p += 1;
        }
        self.primes = (2..size).filter(|&i| !composite[i]).map(|i| i as i64).collect();
        self.limit = limit;
    }
}

impl Default for PrimeTable {
    fn default() -> Self {
        Self::new()
    }
}
