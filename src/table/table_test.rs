// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use std::collections::HashMap;
use std::rc::Rc;

use proptest::prelude::*;

use super::*;
use crate::value::ObjString;

fn key(s: &str) -> Rc<Object> {
    Rc::new(Object::Str(ObjString::new(s)))
}

#[test]
fn set_reports_new_vs_overwrite() {
    let mut table = Table::new();
    let a = key("a");
    assert!(table.set(&a, Value::Number(1.0)));
    assert!(!table.set(&a, Value::Number(2.0)));
    assert_eq!(table.get(&a), Some(&Value::Number(2.0)));
}

#[test]
fn delete_then_get_returns_none() {
    let mut table = Table::new();
    let a = key("a");
    table.set(&a, Value::Number(1.0));
    assert!(table.delete(&a));
    assert_eq!(table.get(&a), None);
    assert!(!table.delete(&a));
}

#[test]
fn tombstone_slot_is_reused_by_later_insert() {
    let mut table = Table::new();
    let a = key("a");
    let b = key("b");
    table.set(&a, Value::Nil);
    table.delete(&a);
    // Reinserting should not grow count beyond what a tombstone reuse implies.
    table.set(&b, Value::Nil);
    assert_eq!(table.get(&b), Some(&Value::Nil));
}

#[test]
fn grows_past_load_factor_without_losing_entries() {
    let mut table = Table::new();
    let mut keys = Vec::new();
    for i in 0..200 {
        let k = key(&format!("key-{i}"));
        table.set(&k, Value::Number(f64::from(i)));
        keys.push(k);
    }
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(table.get(k), Some(&Value::Number(f64::from(i as u32))));
    }
}

#[test]
fn find_string_returns_existing_handle_by_content() {
    let mut table = Table::new();
    let a = key("hello");
    table.set(&a, Value::Nil);

    let found = table.find_string("hello", a.as_str().hash()).expect("present");
    assert!(Rc::ptr_eq(&found, &a));
    assert!(table.find_string("goodbye", 0).is_none());
}

#[test]
fn add_all_copies_every_occupied_entry() {
    let mut src = Table::new();
    let mut dst = Table::new();
    let a = key("a");
    let b = key("b");
    src.set(&a, Value::Number(1.0));
    src.set(&b, Value::Number(2.0));

    src.add_all(&mut dst);

    assert_eq!(dst.get(&a), Some(&Value::Number(1.0)));
    assert_eq!(dst.get(&b), Some(&Value::Number(2.0)));
}

proptest! {
    /// After an arbitrary sequence of set/delete ops, the table must agree
    /// with a reference `HashMap` on the last write per key.
    #[test]
    fn matches_reference_map(ops in proptest::collection::vec(
        (0u8..12, any::<bool>(), -1_000_000.0f64..1_000_000.0), 0..200
    )) {
        let mut table = Table::new();
        let mut reference: HashMap<u8, Option<f64>> = HashMap::new();
        let handles: Vec<Rc<Object>> = (0u8..12).map(|i| key(&format!("k{i}"))).collect();

        for (slot, is_set, value) in ops {
            let k = &handles[slot as usize];
            if is_set {
                table.set(k, Value::Number(value));
                reference.insert(slot, Some(value));
            } else {
                table.delete(k);
                reference.insert(slot, None);
            }
        }

        for (slot, expected) in &reference {
            let k = &handles[*slot as usize];
            match expected {
                Some(v) => prop_assert_eq!(table.get(k), Some(&Value::Number(*v))),
                None => prop_assert_eq!(table.get(k), None),
            }
        }
    }
}
