// This module implements the numeric reference engine: four direct strategies for the
// n-th Fibonacci number that serve as the correctness oracle for generated code and as a
// timing comparison. fib_iterative keeps a running (prev, curr) pair, fib_recursive_naive
// is plain two-way recursion, fib_memoized_recursive recurses through a caller-owned cache
// where zero means "not computed yet", and fib_memoized_iterative fills a call-scoped
// scratch table. All arithmetic is checked so results past u64::MAX surface as
// ReferenceError::Overflow, and storage is reserved fallibly so exhaustion is reported
// as ReferenceError::Allocation instead of terminating the process.

//! Numeric reference engine.
//!
//! The index is a `u32`, so negative inputs cannot be expressed. `fib(0) == 0`
//! and `fib(1) == 1` for every strategy.

pub mod timing;

use crate::core::error::{ReferenceError, ReferenceResult};
use std::fmt;

/// Largest index whose Fibonacci number fits in a `u64`.
pub const MAX_U64_INDEX: u32 = 93;

/// The four reference strategies, in the order the report prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Iterative,
    MemoizedIterative,
    Memoized,
    Recursive,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Iterative,
        Strategy::MemoizedIterative,
        Strategy::Memoized,
        Strategy::Recursive,
    ];

    /// Human-readable name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Iterative => "Iterative",
            Strategy::MemoizedIterative => "Memoized Iterative",
            Strategy::Memoized => "Memoization",
            Strategy::Recursive => "Recursive",
        }
    }

    /// Run this strategy for `n`.
    ///
    /// The memoized recursive strategy gets a fresh zeroed cache that lives
    /// only for this call.
    pub fn run(self, n: u32) -> ReferenceResult<u64> {
        match self {
            Strategy::Iterative => fib_iterative(n),
            Strategy::MemoizedIterative => fib_memoized_iterative(n),
            Strategy::Memoized => {
                let mut memo = memo_cache(n)?;
                fib_memoized_recursive(n, &mut memo)
            }
            Strategy::Recursive => fib_recursive_naive(n),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// O(n) time, O(1) space.
pub fn fib_iterative(n: u32) -> ReferenceResult<u64> {
    if n <= 1 {
        return Ok(u64::from(n));
    }

    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 2..=n {
        let next = prev.checked_add(curr).ok_or(ReferenceError::Overflow { n })?;
        prev = curr;
        curr = next;
    }

    Ok(curr)
}

/// Direct two-way recursion. Exponential; impractical much beyond n = 40.
pub fn fib_recursive_naive(n: u32) -> ReferenceResult<u64> {
    if n <= 1 {
        return Ok(u64::from(n));
    }

    let left = fib_recursive_naive(n - 1)?;
    let right = fib_recursive_naive(n - 2)?;
    left.checked_add(right).ok_or(ReferenceError::Overflow { n })
}

/// Recursion through a caller-owned cache indexed by n.
///
/// A zero entry means "not computed yet" and is recomputed and overwritten.
/// Since fib(0) is itself zero, n <= 1 returns before the cache is consulted.
/// The cache must hold at least `n + 1` entries; entries above `n` are never
/// read or written.
pub fn fib_memoized_recursive(n: u32, memo: &mut [u64]) -> ReferenceResult<u64> {
    if n <= 1 {
        return Ok(u64::from(n));
    }

    let idx = n as usize;
    if memo.len() <= idx {
        return Err(ReferenceError::CacheTooSmall { n, len: memo.len() });
    }

    if memo[idx] == 0 {
        let left = fib_memoized_recursive(n - 1, memo)?;
        let right = fib_memoized_recursive(n - 2, memo)?;
        memo[idx] = left.checked_add(right).ok_or(ReferenceError::Overflow { n })?;
    }

    Ok(memo[idx])
}

/// Bottom-up table of n + 1 entries, released before returning.
pub fn fib_memoized_iterative(n: u32) -> ReferenceResult<u64> {
    if n <= 1 {
        return Ok(u64::from(n));
    }

    let mut table = scratch(n)?;
    table.push(0);
    table.push(1);

    for i in 2..=n as usize {
        let next = table[i - 1]
            .checked_add(table[i - 2])
            .ok_or(ReferenceError::Overflow { n })?;
        table.push(next);
    }

    Ok(table[n as usize])
}

/// Allocate a zeroed memo cache large enough for `fib_memoized_recursive(n, ..)`.
pub fn memo_cache(n: u32) -> ReferenceResult<Vec<u64>> {
    let mut memo = scratch(n)?;
    memo.resize(n as usize + 1, 0);
    Ok(memo)
}

fn scratch(n: u32) -> ReferenceResult<Vec<u64>> {
    let entries = n as usize + 1;
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(entries)
        .map_err(|_| ReferenceError::Allocation { entries })?;
    Ok(storage)
}
