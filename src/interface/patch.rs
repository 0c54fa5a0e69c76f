use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::interface::callable::{Callable, Signature};
use crate::interface::error::PatchError;
use crate::interface::lookup::{resolve_method, MethodTable};
use crate::patch_core::absolute_jump;
use crate::patch_core::common::{read_bytes, CodeAddr};
use crate::patch_core::writer::write_code;

/// A `Mutex` that never stays poisoned: on panic it just recovers the guard.
///
/// A panic inside a patched function would otherwise poison the registry lock
/// and wedge every later apply or revert in the process, which matters more
/// than propagating the poison.
struct NoPoisonMutex<T> {
    inner: Mutex<T>,
}

impl<T> NoPoisonMutex<T> {
    fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Record of one active redirection, keyed by target address in the registry.
struct PatchRecord {
    original_bytes: Vec<u8>,
    replacement: CodeAddr,
}

/// Process-wide table of active patches.
///
/// A single lock serializes every apply and revert sequence, not just the map
/// mutation, so "check compatibility, write trampoline, update registry" is
/// one atomic step from the perspective of any other caller. Coarse on
/// purpose: rewriting code memory is rare and safety trumps throughput.
pub struct PatchRegistry {
    active: NoPoisonMutex<HashMap<CodeAddr, PatchRecord>>,
}

static REGISTRY: Lazy<PatchRegistry> = Lazy::new(PatchRegistry::new);

/// The process-wide registry behind all patch operations. It lives for the
/// process lifetime; nothing persists across restarts.
pub fn registry() -> &'static PatchRegistry {
    &REGISTRY
}

impl PatchRegistry {
    fn new() -> Self {
        Self {
            active: NoPoisonMutex::new(HashMap::new()),
        }
    }

    /// Whether `addr` currently has an active patch.
    pub fn is_patched(&self, addr: CodeAddr) -> bool {
        self.active.lock().contains_key(&addr)
    }

    /// Number of active patches in the process.
    pub fn active_patches(&self) -> usize {
        self.active.lock().len()
    }

    fn apply(&self, patch: &mut Patch) -> Result<(), PatchError> {
        let mut active = self.active.lock();

        if patch.target.signature != patch.replacement.signature {
            return Err(PatchError::SignatureMismatch {
                target: patch.target.signature,
                replacement: patch.replacement.signature,
            });
        }
        if active.contains_key(&patch.target.addr) {
            return Err(PatchError::AlreadyPatched);
        }

        // All checks precede the write: a failure from here on out either
        // leaves the bytes untouched (trampoline generation, first
        // protection change) or is surfaced to the caller with the
        // trampoline already live (restore half of the write).
        let jump = absolute_jump(patch.replacement.addr)?;
        let original = unsafe { read_bytes(patch.target.addr.as_mut_ptr(), jump.len()) };

        unsafe { write_code(patch.target.addr, &jump)? };

        if patch.original_bytes.is_empty() {
            patch.original_bytes = original.clone();
        }
        active.insert(
            patch.target.addr,
            PatchRecord {
                original_bytes: original,
                replacement: patch.replacement.addr,
            },
        );
        patch.applied = true;

        let address = patch.target.addr;
        let redirected_to = patch.replacement.addr;
        debug!(?address, ?redirected_to, "applied patch");
        Ok(())
    }

    fn revert(&self, patch: &mut Patch) -> Result<(), PatchError> {
        let mut active = self.active.lock();

        if patch.original_bytes.is_empty() {
            return Err(PatchError::NotPatched);
        }
        let record = active
            .get(&patch.target.addr)
            .ok_or(PatchError::NotPatched)?;

        // The entry is removed only after the restoring write succeeds, so a
        // failed revert leaves the target patched and registered.
        unsafe { write_code(patch.target.addr, &record.original_bytes)? };

        let removed = active.remove(&patch.target.addr);
        patch.applied = false;

        let address = patch.target.addr;
        let was_redirected_to = removed.map(|record| record.replacement);
        debug!(?address, ?was_redirected_to, "reverted patch");
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Resolved {
    addr: CodeAddr,
    signature: Signature,
}

impl Resolved {
    fn of(callable: &dyn Callable) -> Result<Self, PatchError> {
        match (callable.code_addr(), callable.signature()) {
            (Some(addr), Some(signature)) => Ok(Resolved { addr, signature }),
            _ => Err(PatchError::NotCallable),
        }
    }
}

/// One redirection of a target function to a replacement.
///
/// A `Patch` is either applied (the trampoline occupies the target's entry
/// and the registry holds an entry for its address) or reverted (original
/// bytes restored, no registry entry). It can cycle between the two any
/// number of times; every [`Patch::apply`] re-runs the compatibility and
/// registry checks. Dropping an applied patch reverts it best-effort.
#[derive(Debug)]
pub struct Patch {
    target: Resolved,
    replacement: Resolved,
    /// Populated once, at the moment of first application.
    original_bytes: Vec<u8>,
    applied: bool,
}

impl Patch {
    /// Resolves both callables without applying anything. Fails with
    /// [`PatchError::NotCallable`] if either side lacks a code address or a
    /// signature.
    pub fn new(target: &dyn Callable, replacement: &dyn Callable) -> Result<Self, PatchError> {
        Ok(Patch {
            target: Resolved::of(target)?,
            replacement: Resolved::of(replacement)?,
            original_bytes: Vec::new(),
            applied: false,
        })
    }

    /// Redirects the target to the replacement.
    ///
    /// Verifies signature compatibility and registry state, snapshots the
    /// target's entry bytes on first application, and installs the
    /// trampoline. On failure no registry entry is left behind and, unless
    /// the error came from the restore half of the write, no bytes changed.
    pub fn apply(&mut self) -> Result<(), PatchError> {
        registry().apply(self)
    }

    /// Restores the target's original entry bytes.
    ///
    /// Fails with [`PatchError::NotPatched`] when the patch was never applied
    /// or is already reverted. A reverted patch can be applied again, which
    /// supports temporarily disabling a patch to call through to the original
    /// from inside the replacement.
    pub fn revert(&mut self) -> Result<(), PatchError> {
        registry().revert(self)
    }

    /// Whether this patch currently occupies its target.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// The code address being redirected.
    pub fn target_addr(&self) -> CodeAddr {
        self.target.addr
    }
}

impl Drop for Patch {
    fn drop(&mut self) {
        if !self.applied {
            return;
        }
        if let Err(error) = self.revert() {
            let address = self.target.addr;
            warn!(?address, %error, "failed to revert patch on drop");
        }
    }
}

/// Resolves both callables, verifies compatibility, and redirects calls of
/// `target` to `replacement`.
///
/// Both must have the same argument and return shape. The returned [`Patch`]
/// reverts the redirection on [`Patch::revert`] or on drop.
///
/// ```rust
/// #[inline(never)]
/// fn greeting() -> &'static str {
///     "hello"
/// }
///
/// fn fake_greeting() -> &'static str {
///     "goodbye"
/// }
///
/// let patched = funcpatch::patch(
///     greeting as fn() -> &'static str,
///     fake_greeting as fn() -> &'static str,
/// )
/// .unwrap();
/// assert_eq!(greeting(), "goodbye");
///
/// drop(patched);
/// assert_eq!(greeting(), "hello");
/// ```
pub fn patch(
    target: impl Callable,
    replacement: impl Callable,
) -> Result<Patch, PatchError> {
    let mut patch = Patch::new(&target, &replacement)?;
    patch.apply()?;
    Ok(patch)
}

/// Looks up `name` on `table` (retrying the pointer-receiver variant) and
/// redirects the found method to `replacement`.
pub fn patch_method(
    table: &dyn MethodTable,
    name: &str,
    replacement: impl Callable,
) -> Result<Patch, PatchError> {
    let method = resolve_method(table, name)?;
    let mut patch = Patch::new(&method, &replacement)?;
    patch.apply()?;
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original() -> i32 {
        1
    }

    fn replacement_fn() -> i32 {
        2
    }

    #[test]
    fn new_resolves_fn_pointers() {
        let patch = Patch::new(
            &(original as fn() -> i32),
            &(replacement_fn as fn() -> i32),
        )
        .unwrap();
        assert!(!patch.is_applied());
        assert_eq!(
            patch.target_addr(),
            (original as fn() -> i32).code_addr().unwrap()
        );
    }

    #[test]
    fn new_rejects_handles_without_signatures() {
        let raw = unsafe {
            crate::interface::callable::RawFunc::from_raw(original as fn() -> i32 as *const ())
        };
        let err = Patch::new(&raw, &(replacement_fn as fn() -> i32)).unwrap_err();
        assert!(matches!(err, PatchError::NotCallable));
    }

    #[test]
    fn registry_reports_unpatched_addresses() {
        let addr = (original as fn() -> i32).code_addr().unwrap();
        assert!(!registry().is_patched(addr));
    }
}
