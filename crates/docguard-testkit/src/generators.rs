//! Proptest generators for docguard types.
//!
//! These cover the loosely-typed inputs the engine has to survive: raw
//! table cells, whole tables and document ids.

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::fixtures::TableRow;

/// Emails drawn from a small pool so that lookups sometimes hit.
pub const EMAILS: [&str; 4] = ["a@x.com", "b@x.com", "ops@corp.example", "A@X.COM"];

/// A raw `Timeout_Minutes` cell of any plausible shape.
pub fn timeout_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-100i64..200).prop_map(|n| json!(n)),
        (-10.0f64..500.0).prop_map(|f| json!(f)),
        Just(Value::Null),
        Just(json!("15")),
        Just(json!(true)),
        Just(json!([30])),
    ]
}

/// A raw capability cell. Only a JSON `true` grants.
pub fn grant_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!(true)),
        Just(json!(false)),
        Just(json!(1)),
        Just(json!("true")),
        Just(Value::Null),
    ]
}

/// A raw email cell.
pub fn email_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => prop::sample::select(EMAILS.to_vec()).prop_map(|e| json!(e)),
        1 => Just(Value::Null),
        1 => Just(json!(42)),
    ]
}

pub fn table_row() -> impl Strategy<Value = TableRow> {
    (email_cell(), grant_cell(), grant_cell(), timeout_cell()).prop_map(
        |(email, unlock_structure, export_data, timeout_minutes)| TableRow {
            email,
            unlock_structure,
            export_data,
            timeout_minutes,
        },
    )
}

pub fn table_rows() -> impl Strategy<Value = Vec<TableRow>> {
    prop::collection::vec(table_row(), 0..6)
}

/// Document ids that are safe in request paths.
pub fn document_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{12,24}"
}
