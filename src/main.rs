//! Command-line driver.
//!
//! ```text
//! mpqs-factor 999942000697 --alg mpqs
//! mpqs-factor s24 --alg mpqs --seed 7    # random 24-digit semiprime
//! mpqs-factor r30 --alg ecm              # random 30-digit integer
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use num_bigint::BigInt;
use num_traits::{One, Pow};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use mpqs_factor::{arith, factor};

#[derive(Parser)]
#[command(name = "mpqs-factor", version)]
#[command(about = "Factor integers: trial division, prime powers, ECM, QS, and MPQS")]
struct Cli {
    /// Number to factor: a decimal integer greater than 1, r<d> for a
    /// random d-digit integer, or s<d> for a random d-digit semiprime.
    number: String,

    /// Seed for the random number generator.
    #[arg(long, default_value_t = 0)]
    seed: i64,

    /// Factoring algorithm to use.
    #[arg(long, default_value = "trial")]
    alg: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    logfile: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.logfile.as_ref()) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    let mut rng = StdRng::seed_from_u64(cli.seed as u64);

    let n = match parse_target(&cli.number, &mut rng) {
        Ok(n) => n,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    info!(%n, alg = %cli.alg, seed = cli.seed, "factoring");
    match factor(&n, &cli.alg, &mut rng) {
        Ok(factors) => {
            let product = factors
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("\u{b7}");
            println!("{} = {}", n, product);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(logfile: Option<&PathBuf>) -> Result<(), String> {
    let builder = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG);
    match logfile {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("opening log file {}: {}", path.display(), e))?;
            builder.with_writer(Arc::new(file)).init();
        }
        None => {
            builder.with_writer(std::io::stderr).init();
        }
    }
    Ok(())
}

/// Resolve the positional argument into the number to factor.
fn parse_target(input: &str, rng: &mut StdRng) -> Result<BigInt, String> {
    let ten = BigInt::from(10);
    match input.as_bytes().first() {
        Some(b'r') => {
            // Uniform d-digit number: [10^(d-1), 10^d).
            let digits = parse_digit_count(&input[1..])?;
            let low = Pow::pow(&ten, digits - 1);
            Ok(&low + arith::random_below(&(&low * 9), rng))
        }
        Some(b's') => {
            // d-digit semiprime, the product of two d/2-digit primes.
            let digits = parse_digit_count(&input[1..])?;
            if digits % 2 != 0 {
                return Err("semiprime must have an even number of digits".to_string());
            }
            let low = Pow::pow(&ten, digits - 1);
            let high = &low * 10;
            loop {
                let x = random_prime(digits / 2, rng);
                let y = random_prime(digits / 2, rng);
                let n = x * y;
                if n >= low && n < high {
                    return Ok(n);
                }
            }
        }
        _ => {
            let n = BigInt::parse_bytes(input.as_bytes(), 10)
                .ok_or_else(|| format!("parsing \"{}\": invalid number", input))?;
            if n <= BigInt::one() {
                return Err(format!("invalid n: {}", input));
            }
            Ok(n)
        }
    }
}

fn parse_digit_count(s: &str) -> Result<u32, String> {
    let d: u32 = s
        .parse()
        .map_err(|_| format!("parsing \"{}\": invalid digit count", s))?;
    if d == 0 {
        return Err("digit count must be positive".to_string());
    }
    Ok(d)
}

/// A random probable prime with exactly `digits` decimal digits.
fn random_prime(digits: u32, rng: &mut StdRng) -> BigInt {
    let low = Pow::pow(&BigInt::from(10), digits - 1);
    let width = &low * 9;
    loop {
        let n = &low + arith::random_below(&width, rng);
        if arith::is_probably_prime(&n, 1000, rng) {
            return n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_decimal() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            parse_target("999942000097", &mut rng).unwrap(),
            BigInt::from(999_942_000_097i64)
        );
        assert!(parse_target("1", &mut rng).is_err());
        assert!(parse_target("banana", &mut rng).is_err());
    }

    #[test]
    fn test_parse_target_random() {
        let mut rng = StdRng::seed_from_u64(0);
        let n = parse_target("r6", &mut rng).unwrap();
        assert_eq!(n.to_string().len(), 6);
    }

    #[test]
    fn test_parse_target_semiprime() {
        let mut rng = StdRng::seed_from_u64(0);
        let n = parse_target("s8", &mut rng).unwrap();
        assert_eq!(n.to_string().len(), 8);
        assert!(parse_target("s7", &mut rng).is_err());
    }

    #[test]
    fn test_random_prime_digits() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..3 {
            let p = random_prime(4, &mut rng);
            assert_eq!(p.to_string().len(), 4);
        }
    }
}
