use std::io;

use thiserror::Error;

use crate::interface::callable::Signature;

/// Every failure a patch operation can surface.
///
/// Nothing here is retried internally: each variant is either a programmer
/// error (mismatched signatures, double patching) or an environment failure
/// (the OS refusing a protection change) that a retry cannot fix.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The target or the replacement does not resolve to a callable.
    #[error("the target and/or the replacement is not callable")]
    NotCallable,

    /// The two call signatures differ structurally.
    #[error("the target and the replacement do not share a signature: {target} != {replacement}")]
    SignatureMismatch {
        target: Signature,
        replacement: Signature,
    },

    /// The target's code address already has an active patch.
    #[error("the target is already patched")]
    AlreadyPatched,

    /// Reversal was requested for an address with no active patch.
    #[error("the target is not patched")]
    NotPatched,

    /// Method lookup failed on both the type as given and its pointer variant.
    #[error("method '{0}' not found")]
    MethodNotFound(String),

    /// No trampoline generator exists for the build-target architecture.
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(&'static str),

    /// The OS refused a page-protection change. The underlying failure is
    /// passed through unmodified. When this happens on the restore half of a
    /// write, the new bytes are already live and the page may remain
    /// writable.
    #[error("changing page protection failed: {0}")]
    Protection(#[source] io::Error),
}
