//! Integration tests for role and access key management

mod support;

use atlas_secrets_engine::prelude::*;
use atlas_secrets_engine::testing::InMemoryProvider;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::time::Duration;
use support::{
    Harness, ORGANIZATION_ID, PROJECT_ID, database_user_role, org_key_role, project_key_role, with,
};

#[rstest]
#[case::missing_database_name(json!({
    "credential_type": "database_user",
    "project_id": PROJECT_ID,
    "roles": [{ "databaseName": "admin", "roleName": "atlasAdmin" }],
}))]
#[case::missing_roles(json!({
    "credential_type": "database_user",
    "project_id": PROJECT_ID,
    "database_name": "admin",
}))]
#[case::database_user_with_key_roles(with(database_user_role(), json!({ "programmatic_key_roles": ["ORG_MEMBER"] })))]
#[case::org_key_with_project(with(org_key_role(), json!({ "project_id": PROJECT_ID })))]
#[case::org_key_without_key_roles(json!({
    "credential_type": "org_programmatic_api_key",
    "organization_id": ORGANIZATION_ID,
}))]
#[case::org_key_bad_cidr(with(org_key_role(), json!({ "cidr_blocks": ["10.0.0.0/40"] })))]
#[case::project_key_with_access_list(with(project_key_role(), json!({ "ip_addresses": ["192.0.2.1"] })))]
#[case::ttl_above_max(with(database_user_role(), json!({ "ttl": 5000, "max_ttl": 4000 })))]
#[case::sub_second_ttl(with(database_user_role(), json!({ "ttl": "500ms", "max_ttl": "900ms" })))]
#[case::fractional_max_ttl(with(org_key_role(), json!({ "max_ttl": "1500ms" })))]
#[case::unknown_kind(json!({ "credential_type": "iam_user" }))]
#[case::missing_kind(json!({ "project_id": PROJECT_ID }))]
#[case::unknown_field(with(org_key_role(), json!({ "region": "eu-west-1" })))]
#[tokio::test]
async fn test_invalid_role_is_rejected_before_provider(#[case] body: Value) {
    // GIVEN: A configured engine
    let harness = Harness::configured().await;

    // WHEN: An invalid role is written
    let err = harness.write("roles/bad", body).await.unwrap_err();

    // THEN: Validation fails, nothing is stored and the provider is untouched
    assert!(matches!(err, EngineError::Validation(_)), "{err}");
    assert_eq!(harness.read("roles/bad").await.unwrap(), None);
    let issue = harness.read("creds/bad").await.unwrap_err();
    assert!(matches!(issue, EngineError::RoleNotFound { .. }));
    assert_eq!(harness.provider.total_calls(), 0);
}

#[tokio::test]
async fn test_role_read_returns_written_fields() {
    let harness = Harness::configured().await;
    harness
        .write(
            "roles/test-credential",
            with(database_user_role(), json!({ "ttl": 2000, "max_ttl": "4000s" })),
        )
        .await
        .unwrap();

    let role = harness.read("roles/test-credential").await.unwrap().unwrap();
    assert_eq!(
        Value::Object(role.data),
        json!({
            "credential_type": "database_user",
            "project_id": PROJECT_ID,
            "database_name": "admin",
            "roles": [{ "databaseName": "admin", "roleName": "atlasAdmin" }],
            "ttl": 2000,
            "max_ttl": 4000,
        })
    );
    assert_eq!(role.lease, None);
}

#[tokio::test]
async fn test_sub_second_ttl_never_yields_expired_lease() {
    // GIVEN: A role write with sub-second bounds
    let harness = Harness::configured().await;
    let err = harness
        .write(
            "roles/app",
            with(database_user_role(), json!({ "ttl": "500ms", "max_ttl": "900ms" })),
        )
        .await
        .unwrap_err();

    // THEN: The write names the offending field
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidField { field: "ttl", .. })
    ));

    // WHEN: The same role is written with whole-second bounds
    harness
        .write(
            "roles/app",
            with(database_user_role(), json!({ "ttl": "1s", "max_ttl": "2s" })),
        )
        .await
        .unwrap();
    let lease = harness.read("creds/app").await.unwrap().unwrap().lease.unwrap();

    // THEN: Granted and renewed TTLs stay positive and bounded
    assert_eq!(lease.ttl, Duration::from_secs(1));
    let renewed = harness
        .backend
        .renew(&lease, Duration::from_secs(3600), &harness.ctx)
        .await
        .unwrap()
        .lease
        .unwrap();
    assert_eq!(renewed.ttl, Duration::from_secs(2));
}

#[tokio::test]
async fn test_role_kind_cannot_change() {
    let harness = Harness::configured().await;
    harness.write("roles/ops", org_key_role()).await.unwrap();

    let err = harness
        .write("roles/ops", database_user_role())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::KindChange {
            from: CredentialType::OrgProgrammaticApiKey,
            to: CredentialType::DatabaseUser,
            ..
        })
    ));

    // Same-kind updates are accepted
    harness
        .write("roles/ops", with(org_key_role(), json!({ "ttl": 60 })))
        .await
        .unwrap();
    let role = harness.read("roles/ops").await.unwrap().unwrap();
    assert_eq!(role.data["ttl"], json!(60));
}

#[tokio::test]
async fn test_deleted_role_can_be_recreated_with_new_kind() {
    let harness = Harness::configured().await;
    harness.write("roles/ops", org_key_role()).await.unwrap();
    harness.delete("roles/ops").await.unwrap();

    harness.write("roles/ops", database_user_role()).await.unwrap();
    let role = harness.read("roles/ops").await.unwrap().unwrap();
    assert_eq!(role.data["credential_type"], json!("database_user"));
}

#[tokio::test]
async fn test_deleting_missing_role_succeeds() {
    let harness = Harness::configured().await;
    assert_eq!(harness.delete("roles/never-written").await.unwrap(), None);
}

#[tokio::test]
async fn test_list_roles_when_empty() {
    let harness = Harness::configured().await;
    let listed = harness
        .backend
        .handle(Operation::List, "roles/", None, &harness.ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listed.data["keys"], json!([]));
}

#[rstest]
#[case::missing_private_key(json!({ "public_key": "pub" }))]
#[case::blank_public_key(json!({ "public_key": "  ", "private_key": "priv" }))]
#[case::empty_body(json!({}))]
#[tokio::test]
async fn test_invalid_access_keys_are_rejected(#[case] body: Value) {
    let harness = Harness::unconfigured_with(EngineConfig::default(), InMemoryProvider::new());

    let err = harness.write("config/root", body).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(harness.read("config/root").await.unwrap(), None);
}

#[tokio::test]
async fn test_access_keys_last_write_wins() {
    let harness = Harness::configured().await;
    harness
        .write(
            "config/root",
            json!({ "public_key": "second", "private_key": "secret" }),
        )
        .await
        .unwrap();

    let config = harness.read("config/root").await.unwrap().unwrap();
    assert_eq!(Value::Object(config.data), json!({ "public_key": "second" }));
}

#[tokio::test]
async fn test_deleted_access_keys_block_issuance() {
    let harness = Harness::configured().await;
    harness.write("roles/ops", org_key_role()).await.unwrap();
    harness.delete("config/root").await.unwrap();

    let err = harness.read("creds/ops").await.unwrap_err();
    assert!(matches!(err, EngineError::ConfigMissing));
    assert!(!err.is_retryable());
}
