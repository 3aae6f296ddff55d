//! `jam_pvm_core`: the JAM PVM instruction interpreter, `Ψ_M` marshalling
//! invocation, and `Ψ_A` accumulate invocation, as a plain Rust library.
//!
//! The crate has no process-wide state and no host-language binding layer —
//! callers construct an owned [`pvm::Machine`], run it, and read results back
//! out as plain `Vec<u8>`/`u64` values. Embedding this core behind a
//! WebAssembly/FFI/NAPI boundary for another runtime is left entirely to the
//! embedder.

#![allow(dead_code)]

/// Per-step execution trace, gated behind the `trace_steps` feature so it
/// costs nothing in production builds (and in builds without a `tracing`
/// subscriber installed, since the macro itself is cheap when no subscriber
/// is listening at that level).
#[macro_export]
macro_rules! host_log {
    ($($t:tt)*) => {
        #[cfg(feature = "trace_steps")]
        tracing::trace!($($t)*);
    };
}

/// Logged only on error-ish host-call outcomes (PANIC, HUH, FULL, ...).
/// Enabled by either `trace_steps` or `log_host_calls`.
#[macro_export]
macro_rules! host_log_error {
    ($($t:tt)*) => {
        #[cfg(any(feature = "trace_steps", feature = "log_host_calls"))]
        tracing::warn!($($t)*);
    };
}

mod codec;
mod config;
mod crypto;
mod errors;
mod host_functions;
mod instructions;
mod mock_ram;
mod parser;
mod pvm;
mod ram;
mod simple_ram;
mod types;

pub use codec::{decode_implications_pair, encode_fixed_length, encode_implications_pair};
pub use config::{FetchSystemConstantsConfig, RuntimeConfig, DEFAULT_GAS_LIMIT};
pub use errors::PvmSetupError;
pub use pvm::{accumulate_invocation, Machine, RamKind, SetupAccumulateParams, Status};
pub use types::{
    AccumulateInvocationResult, ExecutionResult, MemoryAccessType, Ram, RegisterState,
    RunProgramResult,
};

/// Decode an encoded implications pair, then re-encode it. Exists for
/// equivalence tests against a reference codec implementation: feed it bytes
/// produced elsewhere and check the round trip is byte-identical.
#[must_use]
pub fn round_trip_implications(
    data: &[u8],
    num_cores: i32,
    num_validators: i32,
    auth_queue_size: i32,
) -> Option<Vec<u8>> {
    let pair_result = decode_implications_pair(data, num_cores, num_validators, auth_queue_size)?;
    Some(encode_implications_pair(
        &pair_result.value,
        num_cores,
        num_validators,
        auth_queue_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_blob_on_empty_program_halts() {
        let mut m = Machine::new(RamKind::Mock);
        let result = m.run_blob(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn fresh_machine_reports_default_gas() {
        let m = Machine::new(RamKind::Mock);
        assert_eq!(m.gas_left, DEFAULT_GAS_LIMIT);
    }
}
