//! The stateful field mapping session.
//!
//! A session owns two lists for one [`FieldContext`]: the displayed `rows`
//! and the offered-but-unmapped `custom_fields`. Every key is in one of the
//! states described by [`Membership`]. Required keys are pinned to the rows:
//! explicit transitions that would unmap them are rejected, and bulk row
//! updates that drop them get the missing rows appended again.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::FieldCatalog;
use crate::error::{FieldsError, Result};
use crate::resolver::{available_fields, default_rows_from, label_for, required_from};
use crate::store::SnapshotStore;
use crate::types::{CustomRow, FieldContext, FieldSpec, Membership, Row, RowValidation};

/// Serializable state of a session, for persisting through a [`SnapshotStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaSnapshot {
    pub context: FieldContext,
    pub rows: Vec<Row>,
    pub custom_fields: Vec<CustomRow>,
    pub next_id: u64,
}

/// Mapping session for one `(service, use case, target)` combination.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    catalog: Arc<FieldCatalog>,
    context: FieldContext,
    available: Vec<FieldSpec>,
    required: Vec<String>,
    rows: Vec<Row>,
    custom_fields: Vec<CustomRow>,
    next_id: u64,
}

impl FieldSchema {
    /// Start a session with the default rows of the context.
    pub fn new(catalog: Arc<FieldCatalog>, context: FieldContext) -> Self {
        let mut schema = Self {
            catalog,
            context,
            available: Vec::new(),
            required: Vec::new(),
            rows: Vec::new(),
            custom_fields: Vec::new(),
            next_id: 1,
        };
        schema.resolve();
        schema.reset_to_defaults();
        schema
    }

    /// Start from a stored snapshot when it belongs to the same context,
    /// otherwise from the defaults.
    pub fn from_store(
        catalog: Arc<FieldCatalog>,
        context: FieldContext,
        store: &dyn SnapshotStore<SchemaSnapshot>,
    ) -> Result<Self> {
        let mut schema = Self::new(catalog, context);
        if let Some(snapshot) = store.get()? {
            if snapshot.context == schema.context {
                schema.restore(snapshot);
            } else {
                debug!(
                    stored = %snapshot.context,
                    requested = %schema.context,
                    "ignoring snapshot for a different context"
                );
            }
        }
        Ok(schema)
    }

    /// Write the current state to a store.
    pub fn save_to(&self, store: &dyn SnapshotStore<SchemaSnapshot>) -> Result<()> {
        store.set(self.snapshot())
    }

    // --- Accessors ---

    pub fn context(&self) -> &FieldContext {
        &self.context
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn custom_fields(&self) -> &[CustomRow] {
        &self.custom_fields
    }

    /// Resolved fields of the current context.
    pub fn available_fields(&self) -> &[FieldSpec] {
        &self.available
    }

    /// Required keys of the current context.
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }

    pub fn membership(&self, key: &str) -> Membership {
        if let Some(row) = self.rows.iter().find(|r| r.key == key) {
            return Membership::Mapped {
                required: row.required,
            };
        }
        if self.custom_fields.iter().any(|c| c.key == key) {
            return Membership::Unmapped;
        }
        Membership::Absent
    }

    // --- Context ---

    /// Switch to another context. Any change discards manual choices and
    /// re-derives rows and custom fields. Returns whether anything changed.
    pub fn set_context(&mut self, context: FieldContext) -> bool {
        if context == self.context {
            return false;
        }
        debug!(from = %self.context, to = %context, "field context changed");
        self.context = context;
        self.resolve();
        self.reset_to_defaults();
        true
    }

    /// Rows become the default rows, custom fields the remaining resolved fields.
    pub fn reset_to_defaults(&mut self) {
        let defaults = default_rows_from(
            &self.catalog,
            &self.context,
            &self.available,
            &self.required,
        );

        let mut rows = Vec::with_capacity(defaults.len());
        for field in defaults {
            let required = self.is_required(&field.key);
            rows.push(Row {
                id: self.allocate_id(),
                label: field.label,
                key: field.key,
                required,
            });
        }

        let row_keys: HashSet<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        self.custom_fields = self
            .available
            .iter()
            .filter(|spec| !row_keys.contains(spec.key.as_str()))
            .map(CustomRow::from_spec)
            .collect();
        self.rows = rows;
    }

    // --- Rows ---

    /// Replace the rows. Required keys missing from `rows` are appended again.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.update_rows(|_| rows);
    }

    /// Replace the rows with a function of the current rows.
    ///
    /// After the update, resolved keys that left the rows return to the custom
    /// fields, keys that entered the rows leave them, and every missing
    /// required key gets a fresh row.
    pub fn update_rows<F>(&mut self, update: F)
    where
        F: FnOnce(&[Row]) -> Vec<Row>,
    {
        let previous: Vec<String> = self.rows.iter().map(|r| r.key.clone()).collect();
        let rows = update(&self.rows);
        self.install_rows(rows);

        let current: HashSet<&str> = self.rows.iter().map(|r| r.key.as_str()).collect();
        let returning: Vec<CustomRow> = previous
            .iter()
            .filter(|key| !current.contains(key.as_str()) && !self.is_required(key))
            .filter(|key| !self.custom_fields.iter().any(|c| &c.key == *key))
            .filter_map(|key| self.available.iter().find(|s| &s.key == key))
            .map(CustomRow::from_spec)
            .collect();
        self.custom_fields.extend(returning);

        self.ensure_required();
    }

    /// A fresh row for `key`, labelled from the resolved fields.
    /// The row is not inserted; pass it to [`set_rows`](Self::set_rows).
    /// The id is consumed even if the row is discarded, so ids may skip.
    pub fn make_row(&mut self, key: &str) -> Row {
        Row {
            id: self.allocate_id(),
            label: label_for(&self.available, key),
            key: key.to_string(),
            required: self.is_required(key),
        }
    }

    /// Move an unmapped key into the rows.
    ///
    /// Works for keys in the custom fields and for resolved keys that are in
    /// neither list. Returns whether the rows changed.
    pub fn map_field(&mut self, key: &str) -> bool {
        if self.rows.iter().any(|r| r.key == key) {
            return false;
        }
        let label = match self.custom_fields.iter().find(|c| c.key == key) {
            Some(custom) => custom.label.clone(),
            None => match self.available.iter().find(|s| s.key == key) {
                Some(spec) => spec.label.clone(),
                None => return false,
            },
        };
        self.custom_fields.retain(|c| c.key != key);
        let row = Row {
            id: self.allocate_id(),
            label,
            key: key.to_string(),
            required: self.is_required(key),
        };
        self.rows.push(row);
        true
    }

    /// Move a mapped row back to the custom fields.
    ///
    /// Required keys are rejected. Returns `Ok(false)` when the key is not mapped.
    pub fn unmap_field(&mut self, key: &str) -> Result<bool> {
        if self.is_required(key) {
            return Err(FieldsError::RequiredField {
                key: key.to_string(),
            });
        }
        let Some(pos) = self.rows.iter().position(|r| r.key == key) else {
            return Ok(false);
        };
        let row = self.rows.remove(pos);
        if !self.custom_fields.iter().any(|c| c.key == key) {
            let custom = match self.available.iter().find(|s| s.key == key) {
                Some(spec) => CustomRow::from_spec(spec),
                None => CustomRow {
                    key: row.key,
                    label: row.label,
                    is_constant: false,
                },
            };
            self.custom_fields.push(custom);
        }
        Ok(true)
    }

    // --- Custom fields ---

    /// Replace the custom fields. Duplicates are allowed and reported by
    /// [`has_any_duplicates`](Self::has_any_duplicates).
    pub fn set_custom_fields(&mut self, custom_fields: Vec<CustomRow>) {
        self.update_custom_fields(|_| custom_fields);
    }

    /// Replace the custom fields with a function of the current ones.
    pub fn update_custom_fields<F>(&mut self, update: F)
    where
        F: FnOnce(&[CustomRow]) -> Vec<CustomRow>,
    {
        self.custom_fields = update(&self.custom_fields);
    }

    /// Offer a resolved key again.
    ///
    /// A required key goes straight into the rows. Other keys are appended to
    /// the custom fields unless already in either list. Unresolved keys are
    /// ignored. Returns whether anything changed.
    pub fn add_custom_field_by_key(&mut self, key: &str) -> bool {
        let Some(spec) = self.available.iter().find(|s| s.key == key).cloned() else {
            debug!(key, context = %self.context, "ignoring unresolved custom field");
            return false;
        };

        if self.is_required(key) {
            let had_custom = self.custom_fields.iter().any(|c| c.key == key);
            self.custom_fields.retain(|c| c.key != key);
            if self.rows.iter().any(|r| r.key == key) {
                return had_custom;
            }
            let row = Row {
                id: self.allocate_id(),
                label: spec.label,
                key: key.to_string(),
                required: true,
            };
            self.rows.push(row);
            return true;
        }

        if self.rows.iter().any(|r| r.key == key) || self.custom_fields.iter().any(|c| c.key == key)
        {
            return false;
        }
        self.custom_fields.push(CustomRow::from_spec(&spec));
        true
    }

    /// Remove the custom field at `index`. Out of range is a no-op.
    pub fn remove_custom_field_by_index(&mut self, index: usize) -> Option<CustomRow> {
        (index < self.custom_fields.len()).then(|| self.custom_fields.remove(index))
    }

    /// Remove every custom field with `key`. Returns whether any was removed.
    pub fn remove_custom_field_by_key(&mut self, key: &str) -> bool {
        let before = self.custom_fields.len();
        self.custom_fields.retain(|c| c.key != key);
        self.custom_fields.len() != before
    }

    // --- Checks ---

    pub fn validate_rows(&self) -> RowValidation {
        let missing_fields: Vec<String> = self
            .required
            .iter()
            .filter(|key| !self.rows.iter().any(|r| &r.key == *key))
            .cloned()
            .collect();
        RowValidation {
            is_valid: missing_fields.is_empty(),
            missing_fields,
        }
    }

    /// Whether `value` clashes with another custom field or with a row.
    ///
    /// With `current_index`, the custom field at that index is the one being
    /// checked and any other occurrence is a clash. Without it, the value must
    /// occur at least twice among the custom fields.
    pub fn is_value_duplicate(&self, value: &str, current_index: Option<usize>) -> bool {
        if value.is_empty() {
            return false;
        }
        if self.rows.iter().any(|r| r.key == value) {
            return true;
        }
        let others = self
            .custom_fields
            .iter()
            .enumerate()
            .filter(|(i, c)| Some(*i) != current_index && c.key == value)
            .count();
        match current_index {
            Some(_) => others >= 1,
            None => others >= 2,
        }
    }

    pub fn has_any_duplicates(&self) -> bool {
        self.custom_fields
            .iter()
            .enumerate()
            .any(|(i, c)| self.is_value_duplicate(&c.key, Some(i)))
    }

    /// The mapped rows in the shape the outbound request body expects.
    pub fn build_data_map_for_request(&self) -> Vec<CustomRow> {
        self.rows
            .iter()
            .map(|row| CustomRow {
                key: row.key.clone(),
                label: row.label.clone(),
                is_constant: self
                    .available
                    .iter()
                    .find(|s| s.key == row.key)
                    .is_some_and(|s| s.is_constant),
            })
            .collect()
    }

    // --- Snapshots ---

    pub fn snapshot(&self) -> SchemaSnapshot {
        SchemaSnapshot {
            context: self.context.clone(),
            rows: self.rows.clone(),
            custom_fields: self.custom_fields.clone(),
            next_id: self.next_id,
        }
    }

    /// Replace the session state with a snapshot.
    ///
    /// Required keys are re-checked against the current catalog, so a stale
    /// snapshot cannot drop them.
    pub fn restore(&mut self, snapshot: SchemaSnapshot) {
        if snapshot.context != self.context {
            self.context = snapshot.context;
            self.resolve();
        }
        self.next_id = self.next_id.max(snapshot.next_id);
        self.custom_fields = snapshot.custom_fields;
        self.install_rows(snapshot.rows);
        self.ensure_required();
    }

    // --- Internal ---

    fn resolve(&mut self) {
        self.available = available_fields(&self.catalog, &self.context);
        self.required = required_from(&self.catalog, &self.context, &self.available);
        debug!(
            context = %self.context,
            available = self.available.len(),
            required = self.required.len(),
            "fields resolved"
        );
    }

    /// Take `rows` as-is apart from the required flags, keep ids ahead of
    /// them and drop their keys from the custom fields.
    fn install_rows(&mut self, mut rows: Vec<Row>) {
        for row in &mut rows {
            row.required = self.is_required(&row.key);
        }
        if let Some(max_id) = rows.iter().map(|r| r.id).max() {
            self.next_id = self.next_id.max(max_id.saturating_add(1));
        }
        self.rows = rows;

        let current: HashSet<&str> = self.rows.iter().map(|r| r.key.as_str()).collect();
        self.custom_fields.retain(|c| !current.contains(c.key.as_str()));
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn ensure_required(&mut self) {
        let missing = self.validate_rows().missing_fields;
        if missing.is_empty() {
            return;
        }
        debug!(?missing, "re-inserting required rows");
        for key in missing {
            let row = Row {
                id: self.allocate_id(),
                label: label_for(&self.available, &key),
                key: key.clone(),
                required: true,
            };
            self.custom_fields.retain(|c| c.key != key);
            self.rows.push(row);
        }
    }
}
