//! Two-tier field resolution over event records.
//!
//! Some schema variants wrap event fields one level deeper, so a field is
//! looked up on the record first and then on each immediate child table.

use crate::log::{Table, Value};

/// Field stored directly on the record.
pub fn lookup_direct<'a>(record: &'a Table, key: &str) -> Option<&'a Value> {
    record.get(key)
}

/// First child table (in key order) that carries the field.
pub fn lookup_nested<'a>(record: &'a Table, key: &str) -> Option<&'a Value> {
    record
        .values()
        .filter_map(Value::as_table)
        .find_map(|child| child.get(key))
}

/// Every candidate for a field, direct hit first, then nested hits in order.
pub fn lookup_candidates<'a>(record: &'a Table, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    lookup_direct(record, key).into_iter().chain(
        record
            .values()
            .filter_map(Value::as_table)
            .filter_map(move |child| child.get(key)),
    )
}

/// Direct lookup, falling back to nested lookup.
pub fn resolve_field<'a>(record: &'a Table, key: &str) -> Option<&'a Value> {
    lookup_direct(record, key).or_else(|| lookup_nested(record, key))
}
