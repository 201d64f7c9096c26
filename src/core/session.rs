// This module provides arena-based generation session management using the bumpalo crate.
// GenerationSession owns a borrowed arena and the emission statistics for one code
// generation run. The arena backs every FunctionAnalysis produced while verifying a
// function (block lists, successor edges, call sites), so analysis results share the
// session lifetime instead of carrying their own heap allocations. SessionStats counts
// declared functions, created blocks, emitted instructions broken down by opcode, and
// self-calls, which lets tests and the CLI confirm what a generator actually produced.

//! Arena-based generation session management.
//!
//! All analysis objects are tied to the session lifetime, eliminating
//! complex lifetime propagation.

use bumpalo::Bump;
use hashbrown::HashMap;
use std::fmt;

/// Arena-based generation session.
pub struct GenerationSession<'arena> {
    /// Arena allocator for analysis objects.
    arena: &'arena Bump,

    /// Session statistics for debugging.
    stats: SessionStats,
}

impl<'arena> GenerationSession<'arena> {
    /// Create a new generation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: SessionStats::default(),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Record that a function was declared.
    pub fn record_function_declared(&mut self, name: &str) {
        self.stats.functions_declared += 1;
        self.stats.last_function_name = name.to_string();
    }

    /// Record that a basic block was appended.
    pub fn record_block_appended(&mut self) {
        self.stats.blocks_appended += 1;
    }

    /// Record an emitted instruction.
    pub fn record_instruction_emitted(&mut self, opcode: &'static str) {
        self.stats.instructions_emitted += 1;
        *self.stats.instruction_counts.entry(opcode).or_insert(0) += 1;
    }

    /// Record a call whose callee is the function under construction.
    pub fn record_self_call(&mut self) {
        self.stats.self_calls += 1;
    }

    /// Get generation statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

/// Generation session statistics.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Number of functions declared.
    pub functions_declared: usize,

    /// Number of basic blocks appended.
    pub blocks_appended: usize,

    /// Number of instructions emitted.
    pub instructions_emitted: usize,

    /// Count of each instruction type emitted.
    pub instruction_counts: HashMap<&'static str, usize>,

    /// Calls that target the function being defined.
    pub self_calls: usize,

    /// Name of the most recently declared function.
    pub last_function_name: String,
}

impl SessionStats {
    /// Number of emitted instructions with the given opcode name.
    pub fn count(&self, opcode: &str) -> usize {
        self.instruction_counts.get(opcode).copied().unwrap_or(0)
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation Session Statistics:")?;
        writeln!(f, "  Functions declared: {}", self.functions_declared)?;
        writeln!(f, "  Blocks appended: {}", self.blocks_appended)?;
        writeln!(f, "  Instructions emitted: {}", self.instructions_emitted)?;

        if self.self_calls > 0 {
            writeln!(f, "  Self-calls: {}", self.self_calls)?;
        }

        if !self.instruction_counts.is_empty() {
            writeln!(f, "  Instruction breakdown:")?;
            let mut sorted: Vec<_> = self.instruction_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

            for (opcode, count) in sorted {
                writeln!(f, "    {}: {}", opcode, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_session_creation() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);

        assert_eq!(session.stats().functions_declared, 0);
        assert_eq!(session.stats().instructions_emitted, 0);
    }

    #[test]
    fn test_session_statistics() {
        let arena = Bump::new();
        let mut session = GenerationSession::new(&arena);

        session.record_function_declared("fib");
        session.record_block_appended();
        session.record_instruction_emitted("add");
        session.record_instruction_emitted("icmp");
        session.record_instruction_emitted("add");
        session.record_self_call();

        let stats = session.stats();
        assert_eq!(stats.functions_declared, 1);
        assert_eq!(stats.blocks_appended, 1);
        assert_eq!(stats.instructions_emitted, 3);
        assert_eq!(stats.count("add"), 2);
        assert_eq!(stats.count("icmp"), 1);
        assert_eq!(stats.count("call"), 0);
        assert_eq!(stats.self_calls, 1);
        assert_eq!(stats.last_function_name, "fib");
    }

    #[test]
    fn test_statistics_display() {
        let arena = Bump::new();
        let mut session = GenerationSession::new(&arena);

        session.record_function_declared("fib");
        session.record_instruction_emitted("call");
        session.record_self_call();

        let output = format!("{}", session.stats());
        assert!(output.contains("Functions declared: 1"));
        assert!(output.contains("Instructions emitted: 1"));
        assert!(output.contains("Self-calls: 1"));
        assert!(output.contains("call: 1"));
    }
}
