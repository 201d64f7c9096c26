//! Timed strategy runs for the reference report.

use super::Strategy;
use crate::core::error::ReferenceResult;
use std::fmt;
use std::time::{Duration, Instant};

/// Result of one timed strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timed {
    pub strategy: Strategy,
    pub n: u32,
    pub value: u64,
    pub elapsed: Duration,
}

/// Run `strategy` for `n` and measure wall-clock time around the call.
pub fn time_strategy(strategy: Strategy, n: u32) -> ReferenceResult<Timed> {
    log::debug!("Starting {} Fibonacci for n={}", strategy, n);

    let start = Instant::now();
    let value = strategy.run(n)?;
    let elapsed = start.elapsed();

    log::info!("{} fib({}) = {} in {:?}", strategy, n, value, elapsed);

    Ok(Timed {
        strategy,
        n,
        value,
        elapsed,
    })
}

impl fmt::Display for Timed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Starting {} Fibonacci for n={}...", self.strategy, self.n)?;
        writeln!(f, "{} Fibonacci for n={}: {}", self.strategy, self.n, self.value)?;
        write!(f, "Time taken (seconds): {:.6}", self.elapsed.as_secs_f64())
    }
}
