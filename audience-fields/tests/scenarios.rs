//! End-to-end scenarios across catalog, config, session and stores.

use std::fs;
use std::sync::Arc;

use audience_fields::{
    available_fields, default_rows_for_service, required_fields, FieldCatalog, FieldContext,
    FieldSchema, FieldsConfig, FieldsError, HintBoard, JsonFileStore, Membership, SchemaSnapshot,
    SnapshotStore,
};
use serial_test::serial;
use tempfile::TempDir;

fn keys<T, F>(items: &[T], key: F) -> Vec<String>
where
    F: Fn(&T) -> &str,
{
    items.iter().map(|item| key(item).to_string()).collect()
}

#[test]
fn mailchimp_generic_both_defaults() {
    let catalog = FieldCatalog::builtin();
    let ctx = FieldContext::new("mailchimp", "generic", "both");

    let rows = default_rows_for_service(&catalog, &ctx);
    assert_eq!(
        keys(&rows, |f| f.key.as_str()),
        ["email", "first_name", "last_name"]
    );
    assert!(required_fields(&catalog, &ctx).is_empty());

    let available = keys(&available_fields(&catalog, &ctx), |f| f.key.as_str());
    for common in ["email", "first_name", "last_name", "phone"] {
        assert!(available.iter().any(|k| k == common), "missing {common}");
    }
}

#[test]
fn default_email_b2b_fields() {
    let catalog = FieldCatalog::builtin();
    let ctx = FieldContext::new("default", "email", "b2b");
    let available = keys(&available_fields(&catalog, &ctx), |f| f.key.as_str());

    for key in ["business_email", "current_company_name", "current_job_title"] {
        assert!(available.iter().any(|k| k == key), "missing {key}");
    }
    assert!(!available.iter().any(|k| k == "personal_email"));
}

#[test]
fn unknown_inputs_resolve_to_common_fields() {
    let catalog = FieldCatalog::builtin();
    let ctx = FieldContext::new("no-such-service", "carrier_pigeon", "martians");

    let available = keys(&available_fields(&catalog, &ctx), |f| f.key.as_str());
    assert_eq!(
        available,
        ["email", "first_name", "last_name", "phone", "list_name"]
    );
    assert!(required_fields(&catalog, &ctx).is_empty());
    assert_eq!(
        keys(&default_rows_for_service(&catalog, &ctx), |f| f.key.as_str()),
        ["email", "first_name", "last_name"]
    );
}

#[test]
fn session_survives_restart_through_json_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sessions/audience.json");
    let catalog = Arc::new(FieldCatalog::builtin());
    let ctx = FieldContext::new("hubspot", "email", "b2b");

    {
        let store: JsonFileStore<SchemaSnapshot> = JsonFileStore::open(&path);
        let mut schema = FieldSchema::from_store(catalog.clone(), ctx.clone(), &store).unwrap();
        assert!(schema.map_field("linkedin_url"));
        assert!(matches!(
            schema.unmap_field("business_email"),
            Err(FieldsError::RequiredField { .. })
        ));
        schema.save_to(&store).unwrap();
    }

    let store: JsonFileStore<SchemaSnapshot> = JsonFileStore::open(&path);
    let schema = FieldSchema::from_store(catalog, ctx, &store).unwrap();
    assert_eq!(
        schema.membership("linkedin_url"),
        Membership::Mapped { required: false }
    );
    assert!(schema.validate_rows().is_valid);
}

#[test]
fn store_subscribers_observe_session_saves() {
    let tmp = TempDir::new().unwrap();
    let store: JsonFileStore<SchemaSnapshot> = JsonFileStore::open(tmp.path().join("s.json"));
    let mut rx = store.subscribe();

    let mut schema = FieldSchema::new(
        Arc::new(FieldCatalog::builtin()),
        FieldContext::new("klaviyo", "tele_marketing", "b2c"),
    );
    schema.unmap_field("phone").unwrap();
    schema.save_to(&store).unwrap();

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone().unwrap();
    assert_eq!(seen, schema.snapshot());
}

#[test]
fn hint_board_persists_through_json_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hints.json");

    {
        let store: JsonFileStore<HintBoard> = JsonFileStore::open(&path);
        let mut board = HintBoard::with_keys(["pixel", "audience"])
            .load_from(&store)
            .unwrap();
        board.toggle_body("audience");
        board.save_to(&store).unwrap();
    }

    let store: JsonFileStore<HintBoard> = JsonFileStore::open(&path);
    let board = HintBoard::with_keys(["pixel", "audience"])
        .load_from(&store)
        .unwrap();
    assert_eq!(board.active(), Some("audience"));
    assert!(board.state("audience").show_body);
}

#[test]
#[serial]
fn configured_catalog_drives_session() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("fields.yaml");
    fs::write(
        &path,
        r#"
extra_fields:
  - key: loyalty_tier
    label: Loyalty Tier
    type: string
    supported_targets: [b2c]
    category: essential
service_defaults:
  shopify: [email, loyalty_tier]
required:
  - use_case: email
    target: b2c
    keys: [personal_email, loyalty_tier]
"#,
    )
    .unwrap();

    let config = FieldsConfig::load(Some(&path)).unwrap();
    let mut catalog = FieldCatalog::builtin();
    catalog.extend(&config);

    let mut schema = FieldSchema::new(
        Arc::new(catalog),
        FieldContext::new("shopify", "email", "b2c"),
    );
    assert_eq!(
        keys(schema.rows(), |r| r.key.as_str()),
        ["email", "loyalty_tier", "personal_email"]
    );
    assert_eq!(schema.required_fields(), ["personal_email", "loyalty_tier"]);

    schema.set_rows(Vec::new());
    assert_eq!(
        keys(schema.rows(), |r| r.key.as_str()),
        ["personal_email", "loyalty_tier"]
    );

    // Outside b2c the field is only a service default, never required.
    schema.set_context(FieldContext::new("shopify", "email", "b2b"));
    assert_eq!(
        schema.membership("loyalty_tier"),
        Membership::Mapped { required: false }
    );
    assert!(schema.validate_rows().is_valid);
}

#[test]
fn catalog_yaml_round_trip_preserves_resolution() {
    let catalog = FieldCatalog::builtin();
    let restored = FieldCatalog::from_yaml(&catalog.to_yaml().unwrap()).unwrap();
    let ctx = FieldContext::new("postal_mail", "postal", "b2b");

    assert_eq!(
        available_fields(&catalog, &ctx),
        available_fields(&restored, &ctx)
    );
    assert_eq!(
        default_rows_for_service(&catalog, &ctx),
        default_rows_for_service(&restored, &ctx)
    );
}
