//! Pure resolution of a [`FieldContext`] against a [`FieldCatalog`].
//!
//! Every function here is total: unknown services, use cases and targets
//! resolve to the fallback or common-only field sets, never to an error.

use std::collections::HashSet;

use crate::catalog::FieldCatalog;
use crate::types::{FieldContext, FieldSpec, ResolvedField};

/// Every field that applies to the context, deduplicated by key.
///
/// Catalog order is the tie-break: the first definition of a key wins.
pub fn available_fields(catalog: &FieldCatalog, ctx: &FieldContext) -> Vec<FieldSpec> {
    let mut seen = HashSet::new();
    catalog
        .fields()
        .iter()
        .filter(|spec| spec.applies_to(ctx.use_case, ctx.target))
        .filter(|spec| seen.insert(spec.key.as_str()))
        .cloned()
        .collect()
}

/// Keys that must stay displayed for the context.
///
/// Configured keys are kept only when they resolve to an essential field.
pub fn required_fields(catalog: &FieldCatalog, ctx: &FieldContext) -> Vec<String> {
    let available = available_fields(catalog, ctx);
    required_from(catalog, ctx, &available)
}

/// The rows shown when a session starts or resets.
///
/// Service default keys come first, then any required key they miss.
pub fn default_rows_for_service(catalog: &FieldCatalog, ctx: &FieldContext) -> Vec<ResolvedField> {
    let available = available_fields(catalog, ctx);
    let required = required_from(catalog, ctx, &available);
    default_rows_from(catalog, ctx, &available, &required)
}

/// Turn a `snake_case` key into a `Title Case` label.
pub fn humanize_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn required_from(
    catalog: &FieldCatalog,
    ctx: &FieldContext,
    available: &[FieldSpec],
) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .required_keys(ctx.use_case, ctx.target)
        .iter()
        .filter(|key| {
            available
                .iter()
                .any(|spec| &spec.key == *key && spec.is_essential())
        })
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect()
}

pub(crate) fn default_rows_from(
    catalog: &FieldCatalog,
    ctx: &FieldContext,
    available: &[FieldSpec],
    required: &[String],
) -> Vec<ResolvedField> {
    let mut seen = HashSet::new();
    catalog
        .default_keys(&ctx.service)
        .iter()
        .chain(required.iter())
        .filter(|key| seen.insert(key.as_str()))
        .map(|key| ResolvedField {
            key: key.clone(),
            label: label_for(available, key),
        })
        .collect()
}

pub(crate) fn label_for(available: &[FieldSpec], key: &str) -> String {
    available
        .iter()
        .find(|spec| spec.key == key)
        .map(|spec| spec.label.clone())
        .unwrap_or_else(|| humanize_key(key))
}
