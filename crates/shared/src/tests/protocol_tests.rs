use super::*;

#[test]
fn create_store_response_with_tenant_id_is_pending() {
    let parsed: CreateStoreAccepted =
        serde_json::from_str(r#"{"tenant_id":"tenant7"}"#).expect("parse");
    assert_eq!(
        parsed,
        CreateStoreAccepted::Pending {
            tenant_id: TenantId("tenant7".into())
        }
    );
}

#[test]
fn create_store_response_with_full_payload_is_ready() {
    let parsed: CreateStoreAccepted = serde_json::from_str(
        r#"{
            "url": "https://s1.example.com",
            "admin_url": "https://s1.example.com/admin",
            "admin_email": "a@x.com",
            "admin_password": "P@ss1234"
        }"#,
    )
    .expect("parse");
    let CreateStoreAccepted::Ready(result) = parsed else {
        panic!("expected ready payload");
    };
    assert_eq!(result.url, "https://s1.example.com");
    assert_eq!(result.admin_password, "P@ss1234");
}

#[test]
fn create_store_response_with_neither_shape_is_rejected() {
    let parsed = serde_json::from_str::<CreateStoreAccepted>(r#"{"status":"ok"}"#);
    assert!(parsed.is_err());
}

#[test]
fn status_response_optional_fields_default_to_absent() {
    let parsed: DeploymentStatusResponse =
        serde_json::from_str(r#"{"status":"processing"}"#).expect("parse");
    assert_eq!(parsed.status, DeploymentStatus::Processing);
    assert!(parsed.percent.is_none());
    assert!(parsed.stage.is_none());
    assert!(parsed.message.is_none());
    assert!(parsed.result.is_none());
}

#[test]
fn status_response_carries_result_on_completion() {
    let parsed: DeploymentStatusResponse = serde_json::from_str(
        r#"{
            "status": "completed",
            "percent": 100,
            "result": {
                "url": "https://s1.example.com",
                "admin_url": "https://s1.example.com/admin",
                "admin_email": "a@x.com",
                "admin_password": "P@ss1234"
            }
        }"#,
    )
    .expect("parse");
    assert_eq!(parsed.status, DeploymentStatus::Completed);
    assert_eq!(parsed.percent, Some(100));
    assert_eq!(
        parsed.result.expect("result").admin_url,
        "https://s1.example.com/admin"
    );
}
