use std::collections::BTreeMap;

use crate::spec::{FormField, FormSchema};
use crate::value::FormValues;

pub type VisibilityMap = BTreeMap<String, bool>;

/// A field without a condition is always shown. A conditional field is shown
/// only while its dependency strictly equals the expected literal; an unset
/// dependency never matches, so a condition on an unknown field keeps the
/// field hidden.
pub fn is_visible(field: &FormField, values: &FormValues) -> bool {
    match &field.conditional {
        None => true,
        Some(rule) => values
            .get(&rule.depends_on)
            .is_some_and(|current| current.strict_eq(&rule.value)),
    }
}

pub fn resolve_visibility(schema: &FormSchema, values: &FormValues) -> VisibilityMap {
    schema
        .fields
        .iter()
        .map(|field| (field.name.clone(), is_visible(field, values)))
        .collect()
}
