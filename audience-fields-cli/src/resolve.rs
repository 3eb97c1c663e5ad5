//! `audience-fields resolve` - show the field sets of one context.

use audience_fields::{
    available_fields, default_rows_for_service, required_fields, FieldCatalog, FieldContext,
    FieldSpec, ResolvedField,
};
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

/// Everything resolved for one context.
#[derive(Debug, Serialize)]
pub struct Resolution {
    pub context: FieldContext,
    pub available: Vec<FieldSpec>,
    pub default_rows: Vec<ResolvedField>,
    pub required: Vec<String>,
}

impl Resolution {
    pub fn new(catalog: &FieldCatalog, context: FieldContext) -> Self {
        Self {
            available: available_fields(catalog, &context),
            default_rows: default_rows_for_service(catalog, &context),
            required: required_fields(catalog, &context),
            context,
        }
    }
}

/// Run the resolve command and print the result.
pub fn run_resolve(
    catalog: &FieldCatalog,
    context: FieldContext,
    json: bool,
) -> anyhow::Result<()> {
    tracing::debug!(%context, "resolving fields");
    let resolution = Resolution::new(catalog, context);
    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("{}", render_table(&resolution));
    }
    Ok(())
}

/// One line per available field, then any default key outside the catalog.
pub fn render_table(resolution: &Resolution) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Key", "Label", "Type", "Category", "Default", "Required"]);

    let is_default = |key: &str| resolution.default_rows.iter().any(|f| f.key == key);
    let is_required = |key: &str| resolution.required.iter().any(|k| k == key);

    for field in &resolution.available {
        table.add_row(vec![
            field.key.clone(),
            field.label.clone(),
            field.type_.to_string(),
            field.category.to_string(),
            yes_no(is_default(&field.key)),
            yes_no(is_required(&field.key)),
        ]);
    }
    for row in &resolution.default_rows {
        if resolution.available.iter().any(|f| f.key == row.key) {
            continue;
        }
        table.add_row(vec![
            row.key.clone(),
            row.label.clone(),
            "-".to_string(),
            "-".to_string(),
            yes_no(true),
            yes_no(is_required(&row.key)),
        ]);
    }

    format!("Context: {}\n{table}", resolution.context)
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "" };
    text.to_string()
}
