//! # funcpatch
//!
//! **funcpatch** redirects calls made through a compiled function to a
//! different function at runtime. It overwrites the target's entry bytes with
//! an unconditional absolute jump to the replacement and can restore the
//! original bytes at any time, so already-compiled behavior can be intercepted
//! or replaced without recompilation — typically from tests or instrumentation.
//!
//! ## Example
//!
//! ```rust
//! use funcpatch::patch;
//!
//! #[inline(never)]
//! fn answer() -> i32 {
//!     1
//! }
//!
//! fn fake_answer() -> i32 {
//!     42
//! }
//!
//! let mut active = patch(answer as fn() -> i32, fake_answer as fn() -> i32).unwrap();
//! assert_eq!(answer(), 42);
//!
//! active.revert().unwrap();
//! assert_eq!(answer(), 1);
//! ```
//!
//! A dropped [`Patch`] that is still applied reverts itself, so patches cannot
//! silently outlive their owning scope.
//!
//! ## Requirements
//!
//! The target must be reached through a real call instruction. Inlined call
//! sites never hit the rewritten entry point, so patch targets should carry
//! `#[inline(never)]` and tests should build without optimization:
//!
//! ```toml
//! [profile.test]
//! opt-level = 0
//! debug = true
//! lto = false
//! incremental = false
//! ```
//!
//! ## Supported platforms
//!
//! - **Operating systems**: Linux, other POSIX systems, Windows
//! - **Architectures**: x86_64, x86, aarch64, arm. Any other architecture
//!   fails with [`PatchError::UnsupportedArchitecture`] before any memory is
//!   touched.
//!
//! ## Known limitation
//!
//! A thread already executing the target past its entry bytes is unaffected by
//! a concurrent patch; it committed to the old code path for that call. A
//! thread that *enters* the target during the short unprotected write window
//! could in principle observe a torn instruction stream. Closing that window
//! would require scheduler cooperation (stop-the-world or per-thread
//! quiescence), which this crate deliberately does not attempt. Patch and
//! revert from a point where no other thread is calling the target.
//!
//! The trampoline also needs room: a target whose compiled body is smaller
//! than the trampoline gets its trailing padding rewritten too, which is
//! harmless on x86_64 (functions are 16-byte aligned) but can clobber an
//! adjacent function on architectures with tighter function alignment.

mod patch_core;
pub mod interface;

pub use interface::callable::{Callable, RawFunc, Signature};
pub use patch_core::common::CodeAddr;
pub use interface::error::PatchError;
pub use interface::lookup::{resolve_method, MethodTable};
pub use interface::patch::{patch, patch_method, registry, Patch, PatchRegistry};
