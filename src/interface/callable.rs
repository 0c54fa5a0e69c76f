use std::any::{type_name, TypeId};
use std::fmt;

use crate::patch_core::common::CodeAddr;

/// Structural descriptor of a call signature.
///
/// Two callables are compatible exactly when their concrete fn-pointer types
/// are the same Rust type, so the descriptor is that type's `TypeId` plus its
/// rendered name for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    id: TypeId,
    name: &'static str,
}

impl Signature {
    /// The signature of the fn-pointer type `F`, e.g.
    /// `Signature::of::<fn(i32) -> bool>()`.
    pub fn of<F: 'static>() -> Self {
        Signature {
            id: TypeId::of::<F>(),
            name: type_name::<F>(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.name)
    }
}

/// An opaque callable the resolver can extract a code address and a call
/// signature from.
///
/// Implemented for plain `fn` pointers (Rust and C ABI) up to twelve
/// arguments, and for [`RawFunc`] handles produced by method lookup or
/// dynamic function synthesis. Either piece may be unknown for a raw handle;
/// patching then fails with `NotCallable`.
pub trait Callable {
    /// The address entered when this callable is invoked, if known.
    fn code_addr(&self) -> Option<CodeAddr>;

    /// The structural call signature, if known.
    fn signature(&self) -> Option<Signature>;
}

/// A function handle synthesized at runtime: a code address plus an
/// optionally known signature.
///
/// This is how the outputs of external collaborators (method lookup tables,
/// dynamic function synthesis) enter the patching core; once resolved they
/// are treated identically to compiled fn pointers. A handle without a
/// signature resolves to `NotCallable` when used in a patch, since its call
/// shape cannot be verified.
#[derive(Clone, Copy, Debug)]
pub struct RawFunc {
    addr: Option<CodeAddr>,
    signature: Option<Signature>,
}

impl RawFunc {
    /// Wraps a raw code pointer together with its call signature.
    ///
    /// # Safety
    ///
    /// `ptr` must be the entry point of a function whose calling convention
    /// and argument/return shape match `signature`, and it must stay valid
    /// for as long as the handle is used.
    pub unsafe fn with_signature(ptr: *const (), signature: Signature) -> Self {
        RawFunc {
            addr: CodeAddr::new(ptr),
            signature: Some(signature),
        }
    }

    /// Wraps a raw code pointer with an unknown signature. The handle can be
    /// inspected but not patched.
    ///
    /// # Safety
    ///
    /// `ptr` must be the entry point of a function and stay valid for as long
    /// as the handle is used.
    pub unsafe fn from_raw(ptr: *const ()) -> Self {
        RawFunc {
            addr: CodeAddr::new(ptr),
            signature: None,
        }
    }
}

impl Callable for RawFunc {
    fn code_addr(&self) -> Option<CodeAddr> {
        self.addr
    }

    fn signature(&self) -> Option<Signature> {
        self.signature
    }
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Ret: 'static $(, $arg: 'static)*> Callable for fn($($arg),*) -> Ret {
            fn code_addr(&self) -> Option<CodeAddr> {
                CodeAddr::new(*self as *const ())
            }

            fn signature(&self) -> Option<Signature> {
                Some(Signature::of::<Self>())
            }
        }

        impl<Ret: 'static $(, $arg: 'static)*> Callable for extern "C" fn($($arg),*) -> Ret {
            fn code_addr(&self) -> Option<CodeAddr> {
                CodeAddr::new(*self as *const ())
            }

            fn signature(&self) -> Option<Signature> {
                Some(Signature::of::<Self>())
            }
        }
    };
}

impl_callable!();
impl_callable!(A);
impl_callable!(A, B);
impl_callable!(A, B, C);
impl_callable!(A, B, C, D);
impl_callable!(A, B, C, D, E);
impl_callable!(A, B, C, D, E, F);
impl_callable!(A, B, C, D, E, F, G);
impl_callable!(A, B, C, D, E, F, G, H);
impl_callable!(A, B, C, D, E, F, G, H, I);
impl_callable!(A, B, C, D, E, F, G, H, I, J);
impl_callable!(A, B, C, D, E, F, G, H, I, J, K);
impl_callable!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Converts a function to a [`RawFunc`] carrying both its code address and
/// its signature, spelled with an explicit argument list.
///
/// This is the form to use when the function takes references, whose
/// higher-ranked fn-pointer types fall outside the blanket [`Callable`]
/// impls:
///
/// ```rust
/// use std::path::Path;
///
/// fn fake_exists(_path: &Path) -> bool {
///     true
/// }
///
/// let handle = funcpatch::func!(fn (fake_exists)(&Path) -> bool);
/// ```
#[macro_export]
macro_rules! func {
    (fn ($f:expr)($($arg:ty),* $(,)?) -> $ret:ty) => {{
        let fn_ptr: fn($($arg),*) -> $ret = $f;
        unsafe {
            $crate::RawFunc::with_signature(
                fn_ptr as *const (),
                $crate::Signature::of::<fn($($arg),*) -> $ret>(),
            )
        }
    }};

    (fn ($f:expr)($($arg:ty),* $(,)?)) => {
        $crate::func!(fn ($f)($($arg),*) -> ())
    };
}

/// Coerces a non-capturing closure to the fn pointer type it conforms to, so
/// it can be used as a replacement:
///
/// ```rust
/// let fake = funcpatch::closure!(|x: i32| x + 10, fn(i32) -> i32);
/// ```
#[macro_export]
macro_rules! closure {
    ($closure:expr, $fn_type:ty) => {{
        let fn_ptr: $fn_type = $closure;
        fn_ptr
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> i32 {
        1
    }

    fn double(x: i32) -> i32 {
        x * 2
    }

    #[test]
    fn same_shape_signatures_are_equal() {
        assert_eq!(
            Signature::of::<fn(i32) -> i32>(),
            Signature::of::<fn(i32) -> i32>()
        );
    }

    #[test]
    fn different_shapes_differ() {
        assert_ne!(
            Signature::of::<fn() -> i32>(),
            Signature::of::<fn(i32) -> i32>()
        );
        assert_ne!(Signature::of::<fn() -> i32>(), Signature::of::<fn() -> u32>());
    }

    #[test]
    fn fn_pointers_resolve_to_their_own_address() {
        let f = double as fn(i32) -> i32;
        assert_eq!(f.code_addr().unwrap(), CodeAddr::new(f as *const ()).unwrap());
        assert_eq!(f.signature().unwrap(), Signature::of::<fn(i32) -> i32>());
    }

    #[test]
    fn raw_func_without_signature_resolves_partially() {
        let raw = unsafe { RawFunc::from_raw(one as fn() -> i32 as *const ()) };
        assert!(raw.code_addr().is_some());
        assert!(raw.signature().is_none());
    }

    #[test]
    fn func_macro_captures_reference_signatures() {
        fn takes_ref(s: &str) -> usize {
            s.len()
        }

        let handle = crate::func!(fn (takes_ref)(&str) -> usize);
        assert!(handle.code_addr().is_some());
        assert_eq!(
            handle.signature().unwrap(),
            Signature::of::<fn(&str) -> usize>()
        );
    }

    #[test]
    fn display_renders_the_fn_type() {
        let rendered = Signature::of::<fn(i32) -> bool>().to_string();
        assert!(rendered.contains("fn(i32) -> bool"));
    }
}
