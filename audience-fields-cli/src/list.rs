//! `audience-fields catalog` and `audience-fields services`.

use audience_fields::{FieldCatalog, FieldSpec};
use comfy_table::{presets::UTF8_FULL, Table};

/// Print every field definition, in catalog order.
pub fn run_catalog(catalog: &FieldCatalog, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog)?);
    } else {
        println!("{}", render_catalog(catalog));
    }
    Ok(())
}

/// Print each service with its default keys.
pub fn run_services(catalog: &FieldCatalog) -> anyhow::Result<()> {
    println!("{}", render_services(catalog));
    Ok(())
}

pub fn render_catalog(catalog: &FieldCatalog) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Key", "Label", "Type", "Category", "Use cases", "Targets",
    ]);

    for field in catalog.fields() {
        table.add_row(vec![
            field.key.clone(),
            constant_label(field),
            field.type_.to_string(),
            field.category.to_string(),
            restriction(field.supported_use_cases.as_deref()),
            restriction(field.supported_targets.as_deref()),
        ]);
    }
    table.to_string()
}

pub fn render_services(catalog: &FieldCatalog) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Service", "Default fields"]);
    for (service, keys) in catalog.services() {
        table.add_row(vec![service.to_string(), keys.join(", ")]);
    }
    table.to_string()
}

fn constant_label(field: &FieldSpec) -> String {
    if field.is_constant {
        format!("{} (constant)", field.label)
    } else {
        field.label.clone()
    }
}

/// Comma-separated restriction, `all` when unrestricted.
fn restriction<T: std::fmt::Display>(values: Option<&[T]>) -> String {
    match values {
        None => "all".to_string(),
        Some(values) => values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_table_shows_restrictions() {
        let output = render_catalog(&FieldCatalog::builtin());
        assert!(output.contains("business_email"));
        assert!(output.contains("tele_marketing"));
        assert!(output.contains("List Name (constant)"));
        assert!(output.contains("all"));
    }

    #[test]
    fn services_table_lists_every_service() {
        let catalog = FieldCatalog::builtin();
        let output = render_services(&catalog);
        for (service, _) in catalog.services() {
            assert!(output.contains(service), "missing {service}");
        }
        assert!(output.contains("email, first_name, last_name"));
    }

    #[test]
    fn restriction_formatting() {
        assert_eq!(restriction::<String>(None), "all");
        assert_eq!(
            restriction(Some(&["b2b".to_string(), "b2c".to_string()][..])),
            "b2b, b2c"
        );
    }
}
