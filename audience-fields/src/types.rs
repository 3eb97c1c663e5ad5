//! Core field, row and context types.
//!
//! All types serialize via serde. Row and custom-row shapes keep the wire
//! names used by the mapping form (`type`/`value`) while the Rust field names
//! say what each one holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a field's value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Email,
    Phone,
    Date,
    Number,
    Url,
    Boolean,
}

/// Informational grouping of a field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    #[default]
    Essential,
    Enrichment,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Url => "url",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCategory::Essential => f.write_str("essential"),
            FieldCategory::Enrichment => f.write_str("enrichment"),
        }
    }
}

/// Marketing channel the mapped data is meant for.
///
/// Parsing never fails: unrecognised strings become [`UseCase::Unknown`],
/// which only matches fields without a use-case restriction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum UseCase {
    Email,
    Postal,
    TeleMarketing,
    Generic,
    Unknown,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Email => "email",
            UseCase::Postal => "postal",
            UseCase::TeleMarketing => "tele_marketing",
            UseCase::Generic => "generic",
            UseCase::Unknown => "unknown",
        }
    }
}

impl From<&str> for UseCase {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" => UseCase::Email,
            "postal" => UseCase::Postal,
            "tele_marketing" | "telemarketing" => UseCase::TeleMarketing,
            "generic" => UseCase::Generic,
            _ => UseCase::Unknown,
        }
    }
}

impl From<String> for UseCase {
    fn from(value: String) -> Self {
        UseCase::from(value.as_str())
    }
}

impl From<UseCase> for String {
    fn from(value: UseCase) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience shape: business contacts, consumer contacts, or either.
///
/// As a field tag, `Both` means the field applies to b2b and b2c audiences.
/// As a requested target, `Both` means the union of the b2b and b2c lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum TargetSchema {
    B2b,
    B2c,
    Both,
    Unknown,
}

impl TargetSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetSchema::B2b => "b2b",
            TargetSchema::B2c => "b2c",
            TargetSchema::Both => "both",
            TargetSchema::Unknown => "unknown",
        }
    }

    /// Whether a field tagged with `tags` belongs to this requested target.
    pub fn accepts(&self, tags: &[TargetSchema]) -> bool {
        tags.iter().any(|tag| match (self, tag) {
            (TargetSchema::B2b, TargetSchema::B2b | TargetSchema::Both) => true,
            (TargetSchema::B2c, TargetSchema::B2c | TargetSchema::Both) => true,
            (TargetSchema::Both, TargetSchema::B2b | TargetSchema::B2c | TargetSchema::Both) => {
                true
            }
            _ => false,
        })
    }
}

impl From<&str> for TargetSchema {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "b2b" => TargetSchema::B2b,
            "b2c" => TargetSchema::B2c,
            "both" => TargetSchema::Both,
            _ => TargetSchema::Unknown,
        }
    }
}

impl From<String> for TargetSchema {
    fn from(value: String) -> Self {
        TargetSchema::from(value.as_str())
    }
}

impl From<TargetSchema> for String {
    fn from(value: TargetSchema) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TargetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate data field in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_constant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_targets: Option<Vec<TargetSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_use_cases: Option<Vec<UseCase>>,
    #[serde(default)]
    pub category: FieldCategory,
}

impl FieldSpec {
    /// An unrestricted essential field.
    pub fn new(key: impl Into<String>, label: impl Into<String>, type_: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            type_,
            is_constant: false,
            supported_targets: None,
            supported_use_cases: None,
            category: FieldCategory::Essential,
        }
    }

    /// Restrict the field to the given targets.
    pub fn targets(mut self, targets: impl IntoIterator<Item = TargetSchema>) -> Self {
        self.supported_targets = Some(targets.into_iter().collect());
        self
    }

    /// Restrict the field to the given use cases.
    pub fn use_cases(mut self, use_cases: impl IntoIterator<Item = UseCase>) -> Self {
        self.supported_use_cases = Some(use_cases.into_iter().collect());
        self
    }

    pub fn enrichment(mut self) -> Self {
        self.category = FieldCategory::Enrichment;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    /// Whether this field resolves for the given use case and target.
    ///
    /// An absent restriction applies to everything, including unknown inputs.
    pub fn applies_to(&self, use_case: UseCase, target: TargetSchema) -> bool {
        let use_case_ok = match &self.supported_use_cases {
            None => true,
            Some(cases) => use_case != UseCase::Unknown && cases.contains(&use_case),
        };
        let target_ok = match &self.supported_targets {
            None => true,
            Some(tags) => target.accepts(tags),
        };
        use_case_ok && target_ok
    }

    pub fn is_essential(&self) -> bool {
        self.category == FieldCategory::Essential
    }
}

/// The `(service, use case, target)` triple every resolution is keyed by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FieldContext {
    pub service: String,
    pub use_case: UseCase,
    pub target: TargetSchema,
}

impl FieldContext {
    pub fn new(
        service: impl Into<String>,
        use_case: impl Into<UseCase>,
        target: impl Into<TargetSchema>,
    ) -> Self {
        Self {
            service: service.into(),
            use_case: use_case.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.service, self.use_case, self.target)
    }
}

/// A `{key, label}` pair produced for default rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedField {
    pub key: String,
    pub label: String,
}

/// A field currently displayed in the mapping form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row {
    pub id: u64,
    #[serde(rename = "type")]
    pub label: String,
    #[serde(rename = "value")]
    pub key: String,
    pub required: bool,
}

/// A resolved field that is available but not displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomRow {
    #[serde(rename = "type")]
    pub key: String,
    #[serde(rename = "value")]
    pub label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_constant: bool,
}

impl CustomRow {
    pub fn from_spec(spec: &FieldSpec) -> Self {
        Self {
            key: spec.key.clone(),
            label: spec.label.clone(),
            is_constant: spec.is_constant,
        }
    }
}

/// Outcome of checking the rows against the required keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowValidation {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
}

/// Where a key currently lives in a schema session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Listed among the custom fields.
    Unmapped,
    /// Displayed as a row.
    Mapped { required: bool },
    /// Neither displayed nor offered.
    Absent,
}
