//! Typed errors for structural/setup failures (Gray Paper §7 category 3, and
//! blob-decode failures). These are distinct from in-band VM outcomes
//! (HALT/PANIC/FAULT/HOST/OOG and host-call sentinels), which remain plain
//! data returned by value: they are expected, frequent outcomes of running
//! untrusted bytecode, not exceptional conditions. `PvmSetupError` instead
//! covers the handful of fallible entry points that run *before* the
//! interpreter starts — cases where the caller handed the VM something it
//! cannot even begin to execute.

use thiserror::Error;

/// Structural failure encountered before (or while) setting up an invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PvmSetupError {
    /// The code blob's bitmask/jump-table framing is structurally inconsistent
    /// (e.g. bitmask length does not match `⌈len(code)/8⌉`).
    #[error("malformed code blob")]
    MalformedBlob,
    /// `Ψ_A` was asked to accumulate a service ID absent from the partial state.
    #[error("service account not found")]
    MissingAccount,
    /// The service account's codehash has no corresponding preimage, or the
    /// preimage resolves to a zero-length code blob.
    #[error("service code not found")]
    MissingCode,
    /// Service code exceeded `MAX_SERVICE_CODE_SIZE`.
    #[error("service code exceeds maximum size")]
    CodeTooLarge,
    /// The encoded implications pair (or partial state / validator set it
    /// carries) failed to decode.
    #[error("malformed implications pair")]
    MalformedImplications,
}
