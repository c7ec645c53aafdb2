//! Diagnostic sink for the emulator core.
//!
//! Messages go through `tracing`; the driver decides where they end up.
//! Timestamps are relative to a `DiagContext` that is created once (usually
//! at process start) and handed to each CPU explicitly; there is no global
//! clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct DiagContext {
    started: Instant,
}

impl Default for DiagContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagContext {
    /// Start the diagnostic clock now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time elapsed since the context was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Report an opcode byte with no entry in the dispatch table.
    pub fn unimplemented_opcode(&self, opcode: u8, eip: u32) {
        tracing::warn!(
            elapsed_ms = self.elapsed().as_secs_f64() * 1000.0,
            "invalid opcode {opcode:#04x} at EIP={eip:#x}"
        );
    }
}
