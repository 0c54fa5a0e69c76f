use funcpatch::{patch_method, resolve_method, Callable, MethodTable, PatchError, RawFunc};

struct Counter {
    value: i32,
}

#[inline(never)]
fn counter_value(counter: &Counter) -> i32 {
    counter.value
}

#[inline(never)]
fn counter_reset(_counter: &Counter) -> i32 {
    0
}

fn fake_counter_value(_counter: &Counter) -> i32 {
    99
}

/// Method table for the value type: only `reset` lives here, `value` is a
/// pointer-receiver method promoted from the pointer table.
struct CounterTable;
struct CounterPointerTable;

impl MethodTable for CounterTable {
    fn method(&self, name: &str) -> Option<RawFunc> {
        match name {
            "reset" => Some(funcpatch::func!(fn (counter_reset)(&Counter) -> i32)),
            _ => None,
        }
    }

    fn pointer_table(&self) -> Option<&dyn MethodTable> {
        Some(&CounterPointerTable)
    }
}

impl MethodTable for CounterPointerTable {
    fn method(&self, name: &str) -> Option<RawFunc> {
        match name {
            "value" => Some(funcpatch::func!(fn (counter_value)(&Counter) -> i32)),
            _ => None,
        }
    }
}

#[test]
fn patches_a_method_found_by_name() {
    let counter = Counter { value: 7 };
    let replacement = funcpatch::func!(fn (fake_counter_value)(&Counter) -> i32);

    let mut active = patch_method(&CounterTable, "value", replacement).unwrap();
    assert_eq!(counter_value(&counter), 99);

    active.revert().unwrap();
    assert_eq!(counter_value(&counter), 7);
}

#[test]
fn resolves_through_pointer_promotion() {
    let found = resolve_method(&CounterTable, "value").unwrap();
    let direct = funcpatch::func!(fn (counter_value)(&Counter) -> i32);

    assert_eq!(found.code_addr().unwrap(), direct.code_addr().unwrap());
}

#[test]
fn unknown_methods_fail_with_method_not_found() {
    let err = patch_method(
        &CounterTable,
        "increment",
        funcpatch::func!(fn (fake_counter_value)(&Counter) -> i32),
    )
    .unwrap_err();

    assert!(matches!(err, PatchError::MethodNotFound(name) if name == "increment"));
}
