//! The field catalog: every known field, per-service default rows and the
//! per-combination required keys.
//!
//! A catalog is an immutable value once built. Consumers start from
//! [`FieldCatalog::builtin()`] or compose their own with
//! [`FieldCatalog::builder()`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FieldsConfig;
use crate::error::{FieldsError, Result};
use crate::types::{FieldSpec, FieldType, TargetSchema, UseCase};

/// Service entry every catalog must carry; unknown services fall back to it.
pub const DEFAULT_SERVICE: &str = "default";

/// Keys that are mandatory for one `(use case, target)` combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredRule {
    pub use_case: UseCase,
    pub target: TargetSchema,
    pub keys: Vec<String>,
}

/// Field definitions, service defaults and required rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
    service_defaults: IndexMap<String, Vec<String>>,
    #[serde(default)]
    required: Vec<RequiredRule>,
}

impl FieldCatalog {
    pub fn builder() -> FieldCatalogBuilder {
        FieldCatalogBuilder::default()
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        use FieldType as T;
        use TargetSchema::{B2b, B2c};
        use UseCase::{Email, Generic, Postal, TeleMarketing};

        let builder = Self::builder()
            // Common to every combination
            .field(FieldSpec::new("email", "Email", T::Email))
            .field(FieldSpec::new("first_name", "First Name", T::String))
            .field(FieldSpec::new("last_name", "Last Name", T::String))
            .field(FieldSpec::new("phone", "Phone", T::Phone))
            .field(FieldSpec::new("list_name", "List Name", T::String).enrichment().constant())
            // Email
            .field(
                FieldSpec::new("business_email", "Business Email", T::Email)
                    .targets([B2b])
                    .use_cases([Email]),
            )
            .field(
                FieldSpec::new("current_company_name", "Company Name", T::String)
                    .targets([B2b])
                    .use_cases([Email]),
            )
            .field(
                FieldSpec::new("current_job_title", "Job Title", T::String)
                    .targets([B2b])
                    .use_cases([Email]),
            )
            .field(
                FieldSpec::new("company_domain", "Company Domain", T::Url)
                    .targets([B2b])
                    .use_cases([Email])
                    .enrichment(),
            )
            .field(
                FieldSpec::new("linkedin_url", "LinkedIn URL", T::Url)
                    .targets([B2b])
                    .use_cases([Email, TeleMarketing])
                    .enrichment(),
            )
            .field(
                FieldSpec::new("personal_email", "Personal Email", T::Email)
                    .targets([B2c])
                    .use_cases([Email]),
            )
            // Postal
            .field(
                FieldSpec::new("current_company_name", "Company (Mailing)", T::String)
                    .targets([B2b])
                    .use_cases([Postal, TeleMarketing]),
            )
            .field(
                FieldSpec::new("company_address", "Company Address", T::String)
                    .targets([B2b])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("company_city", "Company City", T::String)
                    .targets([B2b])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("company_state", "Company State", T::String)
                    .targets([B2b])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("company_zip", "Company Zip", T::String)
                    .targets([B2b])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("personal_address", "Address", T::String)
                    .targets([B2c])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("personal_city", "City", T::String)
                    .targets([B2c])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("personal_state", "State", T::String)
                    .targets([B2c])
                    .use_cases([Postal]),
            )
            .field(
                FieldSpec::new("personal_zip", "Zip Code", T::String)
                    .targets([B2c])
                    .use_cases([Postal]),
            )
            // Tele-marketing
            .field(
                FieldSpec::new("company_phone", "Company Phone", T::Phone)
                    .targets([B2b])
                    .use_cases([TeleMarketing]),
            )
            .field(
                FieldSpec::new("current_job_title", "Job Title", T::String)
                    .targets([B2b])
                    .use_cases([TeleMarketing])
                    .enrichment(),
            )
            .field(
                FieldSpec::new("mobile_phone", "Mobile Phone", T::Phone)
                    .targets([B2c])
                    .use_cases([TeleMarketing]),
            )
            .field(
                FieldSpec::new("do_not_call", "Do Not Call", T::Boolean)
                    .targets([B2c])
                    .use_cases([TeleMarketing])
                    .enrichment(),
            )
            // Generic enrichment, consumer
            .field(generic_b2c("age", "Age", T::Number))
            .field(generic_b2c("gender", "Gender", T::String))
            .field(generic_b2c("birth_date", "Birth Date", T::Date))
            .field(generic_b2c("marital_status", "Marital Status", T::String))
            .field(generic_b2c("income_range", "Income Range", T::String))
            .field(generic_b2c("net_worth", "Net Worth", T::String))
            .field(generic_b2c("homeowner", "Homeowner", T::Boolean))
            // Generic enrichment, business
            .field(generic_b2b("company_industry", "Industry", T::String))
            .field(generic_b2b("company_revenue", "Company Revenue", T::Number))
            .field(generic_b2b("company_employee_count", "Employee Count", T::Number))
            .field(generic_b2b("company_website", "Company Website", T::Url))
            .field(
                FieldSpec::new("country", "Country", T::String)
                    .targets([B2b, B2c])
                    .use_cases([Generic, Postal])
                    .enrichment(),
            );

        let builder = builder
            .service(DEFAULT_SERVICE, ["email", "first_name", "last_name"])
            .service("generic", ["email", "first_name", "last_name"])
            .service("mailchimp", ["email", "first_name", "last_name"])
            .service("sendgrid", ["email", "first_name", "last_name"])
            .service("klaviyo", ["email", "first_name", "last_name", "phone"])
            .service("CSV", ["email", "first_name", "last_name", "phone"])
            .service(
                "meta",
                ["email", "phone", "first_name", "last_name", "zip_code", "country"],
            )
            .service(
                "google_ads",
                ["email", "phone", "first_name", "last_name", "country", "zip_code"],
            )
            .service(
                "hubspot",
                [
                    "email",
                    "first_name",
                    "last_name",
                    "current_company_name",
                    "current_job_title",
                ],
            )
            .service(
                "linkedin",
                [
                    "business_email",
                    "first_name",
                    "last_name",
                    "current_company_name",
                    "current_job_title",
                ],
            )
            .service("postal_mail", ["first_name", "last_name"])
            .service("tele_marketing", ["first_name", "last_name", "phone"]);

        let builder = builder
            .required(Email, B2b, ["business_email"])
            .required(Email, B2c, ["personal_email"])
            .required(Email, TargetSchema::Both, ["email"])
            .required(
                Postal,
                B2b,
                [
                    "first_name",
                    "last_name",
                    "company_address",
                    "company_city",
                    "company_state",
                    "company_zip",
                ],
            )
            .required(
                Postal,
                B2c,
                [
                    "first_name",
                    "last_name",
                    "personal_address",
                    "personal_city",
                    "personal_state",
                    "personal_zip",
                ],
            )
            .required(Postal, TargetSchema::Both, ["first_name", "last_name"])
            .required(TeleMarketing, B2b, ["company_phone"])
            .required(TeleMarketing, B2c, ["mobile_phone"])
            .required(TeleMarketing, TargetSchema::Both, ["phone"]);

        builder.finish()
    }

    /// All field definitions in catalog order. Keys may repeat.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Default row keys for a service.
    ///
    /// Lookup is exact, then case-insensitive, then the `default` entry.
    pub fn default_keys(&self, service: &str) -> &[String] {
        if let Some(keys) = self.service_defaults.get(service) {
            return keys;
        }
        if let Some((_, keys)) = self
            .service_defaults
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(service))
        {
            return keys;
        }
        debug!(service, "unknown service, using default rows");
        self.service_defaults
            .get(DEFAULT_SERVICE)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the service has its own entry (not the fallback).
    pub fn has_service(&self, service: &str) -> bool {
        self.service_defaults
            .keys()
            .any(|name| name.eq_ignore_ascii_case(service))
    }

    /// Service names with their default keys, in declaration order.
    pub fn services(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.service_defaults
            .iter()
            .map(|(name, keys)| (name.as_str(), keys.as_slice()))
    }

    /// Configured required keys for a combination; empty when none.
    pub fn required_keys(&self, use_case: UseCase, target: TargetSchema) -> &[String] {
        self.required
            .iter()
            .find(|rule| rule.use_case == use_case && rule.target == target)
            .map(|rule| rule.keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn required_rules(&self) -> &[RequiredRule] {
        &self.required
    }

    /// Append field definitions after the existing ones.
    ///
    /// Appended fields lose key ties to earlier entries, so they only add keys.
    pub fn add_fields(&mut self, fields: impl IntoIterator<Item = FieldSpec>) {
        self.fields.extend(fields);
    }

    /// Insert or replace a service's default keys.
    pub fn set_service_defaults(&mut self, service: impl Into<String>, keys: Vec<String>) {
        self.service_defaults.insert(service.into(), keys);
    }

    /// Insert or replace the required keys of a combination.
    pub fn set_required(&mut self, rule: RequiredRule) {
        match self
            .required
            .iter_mut()
            .find(|r| r.use_case == rule.use_case && r.target == rule.target)
        {
            Some(existing) => existing.keys = rule.keys,
            None => self.required.push(rule),
        }
    }

    /// Apply configured extra fields, service defaults and required rules.
    pub fn extend(&mut self, config: &FieldsConfig) {
        config.apply(self);
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Parse and validate a catalog from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: FieldCatalog = serde_yaml_ng::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if !self.service_defaults.contains_key(DEFAULT_SERVICE) {
            return Err(FieldsError::InvalidCatalog {
                message: format!("missing '{DEFAULT_SERVICE}' service entry"),
            });
        }
        Ok(())
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn generic_b2c(key: &str, label: &str, type_: FieldType) -> FieldSpec {
    FieldSpec::new(key, label, type_)
        .targets([TargetSchema::B2c])
        .use_cases([UseCase::Generic])
        .enrichment()
}

fn generic_b2b(key: &str, label: &str, type_: FieldType) -> FieldSpec {
    FieldSpec::new(key, label, type_)
        .targets([TargetSchema::B2b])
        .use_cases([UseCase::Generic])
        .enrichment()
}

/// Builder for [`FieldCatalog`].
#[derive(Debug, Default)]
pub struct FieldCatalogBuilder {
    fields: Vec<FieldSpec>,
    service_defaults: IndexMap<String, Vec<String>>,
    required: Vec<RequiredRule>,
}

impl FieldCatalogBuilder {
    /// Add a field definition. Order matters: the first definition of a key wins.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Set the default row keys of a service.
    pub fn service<I, S>(mut self, name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_defaults
            .insert(name.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// Declare the required keys of a combination.
    pub fn required<I, S>(mut self, use_case: UseCase, target: TargetSchema, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.push(RequiredRule {
            use_case,
            target,
            keys: keys.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build, rejecting catalogs without a `default` service entry.
    pub fn build(self) -> Result<FieldCatalog> {
        let catalog = self.finish();
        catalog.validate()?;
        debug!(
            fields = catalog.fields.len(),
            services = catalog.service_defaults.len(),
            "field catalog built"
        );
        Ok(catalog)
    }

    /// Build, inserting an empty `default` service entry when missing.
    pub fn finish(mut self) -> FieldCatalog {
        self.service_defaults
            .entry(DEFAULT_SERVICE.to_string())
            .or_default();
        FieldCatalog {
            fields: self.fields,
            service_defaults: self.service_defaults,
            required: self.required,
        }
    }
}
