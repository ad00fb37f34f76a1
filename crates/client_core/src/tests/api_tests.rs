use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use super::*;
use shared::domain::{DeploymentStatus, TenantId};
use shared::protocol::{CreateStoreAccepted, CreateStoreRequest, DeploymentResult};

async fn spawn_api_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn request() -> CreateStoreRequest {
    CreateStoreRequest {
        email: "admin@example.com".into(),
        password: "P@ss1234".into(),
    }
}

#[tokio::test]
async fn create_store_parses_the_pending_shape() {
    let router = Router::new().route(
        "/create-store",
        post(|Json(body): Json<CreateStoreRequest>| async move {
            assert_eq!(body.email, "admin@example.com");
            Json(json!({ "tenant_id": "tenant4" }))
        }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let accepted = api.create_store(&request()).await.expect("create");
    assert_eq!(
        accepted,
        CreateStoreAccepted::Pending {
            tenant_id: TenantId("tenant4".into())
        }
    );
}

#[tokio::test]
async fn create_store_parses_the_ready_shape() {
    let router = Router::new().route(
        "/create-store",
        post(|| async {
            Json(json!({
                "url": "http://10.0.0.1:8081",
                "admin_url": "http://10.0.0.1:8081/admin",
                "admin_email": "admin@example.com",
                "admin_password": "P@ss1234"
            }))
        }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let accepted = api.create_store(&request()).await.expect("create");
    let CreateStoreAccepted::Ready(result) = accepted else {
        panic!("expected ready payload");
    };
    assert_eq!(result.url, "http://10.0.0.1:8081");
}

#[tokio::test]
async fn create_store_surfaces_the_backend_error_message() {
    let router = Router::new().route(
        "/create-store",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "quota exceeded" })),
            )
        }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let err = api.create_store(&request()).await.expect_err("must fail");
    assert_eq!(err.to_string(), "quota exceeded");
}

#[tokio::test]
async fn create_store_falls_back_to_the_status_code_without_an_error_body() {
    let router = Router::new().route(
        "/create-store",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "downstream out") }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let err = api.create_store(&request()).await.expect_err("must fail");
    assert!(err.to_string().contains("503"), "got: {err}");
}

#[tokio::test]
async fn create_store_rejects_a_body_with_neither_shape() {
    let router = Router::new().route(
        "/create-store",
        post(|| async { Json(json!({ "ok": true })) }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let err = api.create_store(&request()).await.expect_err("must fail");
    assert!(
        err.to_string().contains("neither a tenant id nor a result"),
        "got: {err}"
    );
}

#[tokio::test]
async fn deployment_status_hits_the_tenant_path_and_parses_the_body() {
    let router = Router::new().route(
        "/deployment-status/:tenant_id",
        get(|Path(tenant_id): Path<String>| async move {
            assert_eq!(tenant_id, "tenant9");
            Json(json!({
                "status": "processing",
                "percent": 40,
                "stage": "database"
            }))
        }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let report = api
        .deployment_status(&TenantId("tenant9".into()))
        .await
        .expect("status");
    assert_eq!(report.status, DeploymentStatus::Processing);
    assert_eq!(report.percent, Some(40));
    assert_eq!(report.stage.as_deref(), Some("database"));
    assert_eq!(report.result, None::<DeploymentResult>);
}

#[tokio::test]
async fn deployment_status_treats_non_success_as_an_error() {
    let router = Router::new().route(
        "/deployment-status/:tenant_id",
        get(|| async { StatusCode::BAD_GATEWAY }),
    );
    let base_url = spawn_api_server(router).await;
    let api = HttpProvisioningApi::new(&base_url).expect("api");

    let err = api
        .deployment_status(&TenantId("tenant9".into()))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("non-success"), "got: {err}");
}

#[test]
fn rejects_an_invalid_base_url() {
    assert!(HttpProvisioningApi::new("not a url").is_err());
}
