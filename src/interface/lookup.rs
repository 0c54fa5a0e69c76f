use crate::interface::callable::RawFunc;
use crate::interface::error::PatchError;

/// Describes a type's method set to the resolver.
///
/// This is the boundary to the external type/method lookup collaborator: an
/// implementation maps method names to [`RawFunc`] handles however the host
/// runtime sees fit. Value aggregates commonly promote pointer-receiver
/// methods, so a table may expose the pointer-to-type variant through
/// [`MethodTable::pointer_table`]; the resolver retries against it when the
/// direct lookup misses.
pub trait MethodTable {
    /// Looks up `name` among the methods of the type as given.
    fn method(&self, name: &str) -> Option<RawFunc>;

    /// The method table of the pointer-to-type variant, when one exists.
    fn pointer_table(&self) -> Option<&dyn MethodTable> {
        None
    }
}

/// Resolves `name` on `table`, retrying the pointer-receiver table on a miss.
///
/// Fails with [`PatchError::MethodNotFound`] when neither search succeeds.
pub fn resolve_method(table: &dyn MethodTable, name: &str) -> Result<RawFunc, PatchError> {
    if let Some(found) = table.method(name) {
        return Ok(found);
    }

    if let Some(promoted) = table.pointer_table().and_then(|ptr| ptr.method(name)) {
        return Ok(promoted);
    }

    Err(PatchError::MethodNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::callable::{Callable, Signature};

    fn by_value() -> i32 {
        1
    }

    fn by_pointer() -> i32 {
        2
    }

    struct ValueTable;
    struct PointerTable;

    impl MethodTable for ValueTable {
        fn method(&self, name: &str) -> Option<RawFunc> {
            match name {
                "by_value" => Some(crate::func!(fn (by_value)() -> i32)),
                _ => None,
            }
        }

        fn pointer_table(&self) -> Option<&dyn MethodTable> {
            Some(&PointerTable)
        }
    }

    impl MethodTable for PointerTable {
        fn method(&self, name: &str) -> Option<RawFunc> {
            match name {
                "by_pointer" => Some(crate::func!(fn (by_pointer)() -> i32)),
                _ => None,
            }
        }
    }

    #[test]
    fn finds_direct_methods() {
        let found = resolve_method(&ValueTable, "by_value").unwrap();
        assert_eq!(found.signature().unwrap(), Signature::of::<fn() -> i32>());
    }

    #[test]
    fn promotes_pointer_receiver_methods() {
        let found = resolve_method(&ValueTable, "by_pointer").unwrap();
        assert_eq!(
            found.code_addr().unwrap(),
            (by_pointer as fn() -> i32).code_addr().unwrap()
        );
    }

    #[test]
    fn misses_on_both_tables_fail() {
        let err = resolve_method(&ValueTable, "nonexistent").unwrap_err();
        assert!(matches!(err, PatchError::MethodNotFound(name) if name == "nonexistent"));
    }

    #[test]
    fn tables_without_pointer_variant_fail_after_one_search() {
        let err = resolve_method(&PointerTable, "by_value").unwrap_err();
        assert!(matches!(err, PatchError::MethodNotFound(_)));
    }
}
