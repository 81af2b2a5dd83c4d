//! Contract tests against an in-process stub of the remote service.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use remote_formula_client::{
    ApiClient, AuthError, CatalogError, ClientConfig, CredentialError, CredentialRequest,
    SubmitError,
};
use remote_formula_core::{
    Context, ExecutionId, ExecutionOutcome, FormulaDescriptor, InputKind, InputValue, Session,
    StatusSource,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone)]
struct Recorded {
    headers: HeaderMap,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn serve(router: Router) -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    ApiClient::new(ClientConfig::new(format!("http://{addr}"))).expect("client")
}

fn header<'a>(recorded: &'a Recorded, name: &str) -> &'a str {
    recorded
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn session() -> Session {
    Session::new("tok-123", 3600)
}

fn login_router(status: StatusCode, log: Log) -> Router {
    Router::new().route(
        "/login",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            log.lock().unwrap().push(Recorded { headers, body });
            if status == StatusCode::OK {
                Json(json!({"token": "tok-123", "ttl": 3600})).into_response()
            } else {
                status.into_response()
            }
        }),
    )
}

#[tokio::test]
async fn test_login_success() {
    let log = Log::default();
    let client = serve(login_router(StatusCode::OK, log.clone())).await;

    let session = assert_ok!(client.authenticate("dev", "pw").await);
    assert_eq!(session, Session::new("tok-123", 3600));

    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(header(&recorded, "x-org"), "zup");
    assert_eq!(recorded.body, json!({"username": "dev", "password": "pw"}));
}

#[tokio::test]
async fn test_login_failures() {
    let client = serve(login_router(StatusCode::UNAUTHORIZED, Log::default())).await;
    assert!(matches!(
        client.authenticate("dev", "bad").await,
        Err(AuthError::InvalidCredentials)
    ));

    let client = serve(login_router(StatusCode::BAD_GATEWAY, Log::default())).await;
    match client.authenticate("dev", "pw").await {
        Err(AuthError::Rejected(status)) => assert_eq!(status.as_u16(), 502),
        other => panic!("unexpected login result: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap();
    assert!(matches!(
        client.authenticate("dev", "pw").await,
        Err(AuthError::Transport(_))
    ));
}

#[tokio::test]
async fn test_formulas_catalog() {
    let log = Log::default();
    let recorder = log.clone();
    let router = Router::new().route(
        "/formulas",
        get(move |headers: HeaderMap| async move {
            recorder.lock().unwrap().push(Recorded {
                headers,
                body: Value::Null,
            });
            Json(json!({
                "contexts": [{"name": "dev"}],
                "formulas": [{
                    "command": "deploy",
                    "inputs": [{"name": "env", "label": "Env", "type": "text", "items": ["qa"]}]
                }]
            }))
        }),
    );
    let client = serve(router).await;

    let catalog = assert_ok!(client.formulas(&session()).await);
    assert_eq!(catalog.context_names(), vec!["dev"]);
    assert_eq!(catalog.formulas[0].inputs[0].kind, InputKind::Text);

    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(header(&recorded, "x-authorization"), "tok-123");
    assert_eq!(header(&recorded, "x-org"), "zup");
}

#[tokio::test]
async fn test_formulas_unauthorized() {
    let router = Router::new().route("/formulas", get(|| async { StatusCode::FORBIDDEN }));
    let client = serve(router).await;
    assert!(matches!(
        client.formulas(&session()).await,
        Err(CatalogError::Unauthorized)
    ));
}

fn commands_router(status: StatusCode, log: Log) -> Router {
    Router::new().route(
        "/commands",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            log.lock().unwrap().push(Recorded { headers, body });
            status
        }),
    )
}

#[tokio::test]
async fn test_submit_preserves_input_order_and_kinds() {
    let log = Log::default();
    let client = serve(commands_router(StatusCode::CREATED, log.clone())).await;
    let formula = FormulaDescriptor {
        command: "deploy app".into(),
        inputs: vec![],
    };
    let inputs = vec![
        InputValue::new("env", "text", "prod"),
        InputValue::new("verbose", "boolean", "true"),
    ];

    let id = assert_ok!(
        client
            .submit(&formula, &session(), &Context::new("prod-ctx"), inputs)
            .await
    );

    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(header(&recorded, "x-ctx"), "prod-ctx");
    assert_eq!(header(&recorded, "x-authorization"), "tok-123");
    assert_eq!(recorded.body["id"], id.as_str());
    assert_eq!(recorded.body["command"], "deploy app");
    assert_eq!(
        recorded.body["inputs"],
        json!([
            {"name": "env", "type": "text", "value": "prod"},
            {"name": "verbose", "type": "bool", "value": "true"}
        ])
    );
}

#[tokio::test]
async fn test_submit_failures() {
    let formula = FormulaDescriptor {
        command: "deploy".into(),
        inputs: vec![],
    };
    let ctx = Context::new("dev");

    let client = serve(commands_router(StatusCode::UNAUTHORIZED, Log::default())).await;
    assert!(matches!(
        client.submit(&formula, &session(), &ctx, vec![]).await,
        Err(SubmitError::Unauthorized)
    ));

    let client = serve(commands_router(StatusCode::FORBIDDEN, Log::default())).await;
    assert!(matches!(
        client.submit(&formula, &session(), &ctx, vec![]).await,
        Err(SubmitError::Unauthorized)
    ));

    let log = Log::default();
    let client = serve(commands_router(StatusCode::OK, log.clone())).await;
    assert!(matches!(
        client.submit(&formula, &session(), &ctx, vec![]).await,
        Err(SubmitError::Rejected(_))
    ));
    assert_eq!(log.lock().unwrap().len(), 1);
}

async fn execution(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if headers.get("x-ctx").is_none() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match id.as_str() {
        "ready" => Json(json!({
            "status": "Ready",
            "content": {
                "id": "ready",
                "user": "dev",
                "startTime": 1_700_000_000,
                "endTime": 1_700_000_007,
                "formulaOutput": "out",
                "formulaErr": "err"
            }
        }))
        .into_response(),
        "running" => Json(json!({"status": "Running", "content": {"id": "running"}})).into_response(),
        "denied" => StatusCode::UNAUTHORIZED.into_response(),
        "forbidden" => StatusCode::FORBIDDEN.into_response(),
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[tokio::test]
async fn test_fetch_status_mapping() {
    let client = serve(Router::new().route("/executions/{id}", get(execution))).await;
    let ctx = Context::new("dev");
    let fetch = |id: &'static str| {
        let client = client.clone();
        let ctx = ctx.clone();
        async move { client.fetch(&session(), &ExecutionId::new(id), &ctx).await }
    };

    match fetch("ready").await {
        ExecutionOutcome::Ready(report) => {
            assert_eq!(report.execution_id.as_str(), "ready");
            assert_eq!(report.elapsed().as_secs(), 7);
            assert_eq!(report.stdout, "out");
            assert_eq!(report.stderr, "err");
        }
        other => panic!("expected ready, got {other:?}"),
    }
    assert_eq!(fetch("running").await, ExecutionOutcome::Pending);
    assert_eq!(fetch("unknown").await, ExecutionOutcome::NotFound);
    assert!(matches!(fetch("denied").await, ExecutionOutcome::AuthError(_)));
    assert!(matches!(fetch("forbidden").await, ExecutionOutcome::AuthError(_)));
    assert!(matches!(fetch("broken").await, ExecutionOutcome::TransientError(_)));
    assert!(matches!(fetch("garbled").await, ExecutionOutcome::TransientError(_)));
}

#[tokio::test]
async fn test_fetch_transport_failure_is_transient() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap();
    let outcome = client
        .fetch(&session(), &ExecutionId::new("x"), &Context::new("dev"))
        .await;
    assert!(matches!(outcome, ExecutionOutcome::TransientError(_)));
}

fn credentials_router(status: StatusCode, log: Log) -> Router {
    Router::new().route(
        "/credentials",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            log.lock().unwrap().push(Recorded { headers, body });
            (status, "quota exceeded")
        }),
    )
}

#[tokio::test]
async fn test_set_credential() {
    let log = Log::default();
    let client = serve(credentials_router(StatusCode::CREATED, log.clone())).await;
    let request = CredentialRequest::new("github", "octo", "ghp_x");

    assert_ok!(
        client
            .set_credential(&session(), &Context::new("dev"), &request)
            .await
    );
    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(header(&recorded, "x-ctx"), "dev");
    assert_eq!(
        recorded.body,
        json!({"service": "github", "credential": {"username": "octo", "token": "ghp_x"}})
    );
}

#[tokio::test]
async fn test_set_credential_failures() {
    let request = CredentialRequest::new("aws", "AKIA", "secret");
    let ctx = Context::new("dev");

    let client = serve(credentials_router(StatusCode::UNAUTHORIZED, Log::default())).await;
    assert!(matches!(
        client.set_credential(&session(), &ctx, &request).await,
        Err(CredentialError::Unauthorized)
    ));

    let client = serve(credentials_router(StatusCode::FORBIDDEN, Log::default())).await;
    assert!(matches!(
        client.set_credential(&session(), &ctx, &request).await,
        Err(CredentialError::Forbidden)
    ));

    let client = serve(credentials_router(StatusCode::TOO_MANY_REQUESTS, Log::default())).await;
    let err = assert_err!(client.set_credential(&session(), &ctx, &request).await);
    match err {
        CredentialError::Rejected { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
