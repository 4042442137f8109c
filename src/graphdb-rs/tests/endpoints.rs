//! Endpoint groups against a stub GraphDB server.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query};
use axum::http::{header, HeaderMap, StatusCode as ServerStatus};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use graphdb_rs::{
    BackupOptions, Client, ClientError, ClusterConfig, ClusterOp, Messages, ReportState,
    RestoreOptions, SavedQuery, SparqlTemplate,
};
use serde_json::{json, Value};
use std::collections::HashMap;

#[tokio::test]
async fn test_repository_infos() {
    let router = Router::new().route(
        "/rest/repositories",
        get(|| async {
            Json(json!([{
                "id": "movies",
                "title": "Movies",
                "uri": "http://localhost:7200/repositories/movies",
                "type": "graphdb",
                "sesameType": "graphdb:SailRepository",
                "local": true,
                "readable": true,
                "writable": true,
                "state": "RUNNING"
            }]))
        }),
    );
    let client = common::client_for(router).await;

    let infos = client.repositories().infos(vec![]).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].id, "movies");
    assert_eq!(infos[0].repository_type, "graphdb");
    assert!(infos[0].writable);
}

#[tokio::test]
async fn test_sparql_template_update_sends_text_query() {
    let router = Router::new().route(
        "/rest/repositories/movies/sparql-templates",
        put(
            |Query(params): Query<HashMap<String, String>>, headers: HeaderMap, body: String| async move {
                assert_eq!(params["templateID"], "http://example.com/tpl");
                assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
                assert_eq!(body, "DELETE WHERE { ?s ?p ?o }");
                ServerStatus::OK
            },
        ),
    );
    let client = common::client_for(router).await;

    let template = SparqlTemplate {
        id: "http://example.com/tpl".to_string(),
        query: "DELETE WHERE { ?s ?p ?o }".to_string(),
    };
    client
        .repositories()
        .update_sparql_template("movies", &template, vec![])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cluster_errors_keep_server_messages() {
    let router = Router::new()
        .route(
            "/rest/cluster/config",
            post(|| async {
                (
                    ServerStatus::BAD_REQUEST,
                    Json(json!({"messages": ["node-1:7300 is unreachable"]})),
                )
            }),
        )
        .route(
            "/rest/cluster/config/node",
            post(|| async {
                (
                    ServerStatus::PRECONDITION_FAILED,
                    Json(json!({"node-2:7300": "not in the cluster"})),
                )
            }),
        );
    let client = common::client_for(router).await;

    let config = ClusterConfig::with_nodes(["node-1:7300"]);
    let err = client.cluster().create(&config, vec![]).await.unwrap_err();
    let cluster = err.as_cluster().expect("cluster error");
    assert_eq!(cluster.op, ClusterOp::CreateConfig);
    assert_eq!(cluster.status, 400);
    assert_eq!(
        cluster.messages,
        Messages::List(vec!["node-1:7300 is unreachable".to_string()])
    );
    assert_eq!(err.status(), Some(400));

    let err = client
        .cluster()
        .add_nodes(&["node-2:7300".to_string()], vec![])
        .await
        .unwrap_err();
    let cluster = err.as_cluster().expect("cluster error");
    assert_eq!(cluster.op, ClusterOp::AddNodes);
    assert_eq!(cluster.status, 412);
    match &cluster.messages {
        Messages::Map(map) => assert_eq!(map["node-2:7300"], "not in the cluster"),
        other => panic!("expected keyed messages, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cluster_create_returns_node_outcomes() {
    let router = Router::new().route(
        "/rest/cluster/config",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["nodes"], json!(["node-1:7300"]));
            (ServerStatus::CREATED, Json(json!({"node-1:7300": "created"})))
        }),
    );
    let client = common::client_for(router).await;

    let outcome = client
        .cluster()
        .create(&ClusterConfig::with_nodes(["node-1:7300"]), vec![])
        .await
        .unwrap();
    assert_eq!(outcome["node-1:7300"], "created");
}

#[tokio::test]
async fn test_backup_streams_archive_with_server_filename() {
    let router = Router::new().route(
        "/rest/recovery/backup",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers[header::ACCEPT], "application/json");
            assert_eq!(body, json!({"repositories": ["movies"]}));
            (
                [(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"fallback.tar\"; filename*=UTF-8''snap%20shot%E2%82%AC.tar",
                )],
                "archive-bytes",
            )
        }),
    );
    let client = common::client_for(router).await;

    let opts = BackupOptions {
        repositories: vec!["movies".to_string()],
        ..Default::default()
    };
    let mut archive = Vec::new();
    let filename = client
        .backups()
        .create(&opts, &mut archive, vec![])
        .await
        .unwrap();

    assert_eq!(filename, "snap shot€.tar");
    assert_eq!(archive, b"archive-bytes");
}

#[tokio::test]
async fn test_backup_without_filename_uses_default() {
    let router = Router::new().route("/rest/recovery/backup", post(|| async { "tar" }));
    let client = common::client_for(router).await;

    let mut archive = Vec::new();
    let filename = client
        .backups()
        .create(&BackupOptions::default(), &mut archive, vec![])
        .await
        .unwrap();
    assert_eq!(filename, "backup.tar");
}

#[tokio::test]
async fn test_backup_to_bucket_is_rejected_locally() {
    let client = Client::new("http://127.0.0.1:9");
    let opts = BackupOptions {
        bucket_uri: "s3:///bucket/backup.tar".to_string(),
        ..Default::default()
    };

    let mut sink = Vec::new();
    let err = client.backups().create(&opts, &mut sink, vec![]).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}

type SeenParts = Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>;

#[tokio::test]
async fn test_restore_uploads_params_and_archive() {
    let seen: SeenParts = Arc::default();
    let captured = seen.clone();
    let router = Router::new().route(
        "/rest/recovery/restore",
        post(move |mut form: Multipart| {
            let captured = captured.clone();
            async move {
                while let Some(field) = form.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.unwrap().to_vec();
                    captured.lock().unwrap().push((name, file_name, data));
                }
                ServerStatus::OK
            }
        }),
    );
    let client = common::client_for(router).await;

    let opts = RestoreOptions {
        remove_stale_repositories: true,
        ..Default::default()
    };
    let archive = std::io::Cursor::new(b"tar-contents".to_vec());
    client.backups().restore(&opts, archive, vec![]).await.unwrap();

    let parts = seen.lock().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].0, "params");
    let params: Value = serde_json::from_slice(&parts[0].2).unwrap();
    assert_eq!(params, json!({"removeStaleRepositories": true}));
    assert_eq!(parts[1].0, "file");
    assert_eq!(parts[1].1.as_deref(), Some("backup.tar"));
    assert_eq!(parts[1].2, b"tar-contents");
}

#[tokio::test]
async fn test_report_lifecycle() {
    let router = Router::new()
        .route(
            "/rest/report",
            post(|| async { ServerStatus::ACCEPTED }).get(|| async {
                ([(header::CONTENT_DISPOSITION, "attachment; filename=\"server-report.zip\"")], "zip")
            }),
        )
        .route("/rest/report/status", get(|| async { "READY|1700000000000|\n" }));
    let client = common::client_for(router).await;

    client.report().generate(vec![]).await.unwrap();

    let status = client.report().status(vec![]).await.unwrap();
    assert_eq!(status.state, ReportState::Ready);
    assert_eq!(status.time.unwrap().timestamp_millis(), 1_700_000_000_000);

    let mut zip = Vec::new();
    let name = client.report().download(&mut zip, vec![]).await.unwrap();
    assert_eq!(name, "server-report.zip");
    assert_eq!(zip, b"zip");
}

#[tokio::test]
async fn test_report_generation_failure() {
    let router = Router::new().route(
        "/rest/report",
        post(|| async { (ServerStatus::INTERNAL_SERVER_ERROR, "busy") }),
    );
    let client = common::client_for(router).await;

    let err = client.report().generate(vec![]).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_login_returns_token() {
    let router = Router::new().route(
        "/rest/login",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body, json!({"username": "admin", "password": "root"}));
            (
                [(header::AUTHORIZATION, "GDB eyJ1c2VybmFtZSI6ImFkbWluIn0")],
                Json(json!({"username": "admin", "authorities": ["ROLE_ADMIN"]})),
            )
        }),
    );
    let client = common::client_for(router).await;

    let (token, details) = client.security().login("admin", "root", vec![]).await.unwrap();
    assert_eq!(token, "eyJ1c2VybmFtZSI6ImFkbWluIn0");
    assert_eq!(details.username, "admin");
    assert_eq!(details.authorities, vec!["ROLE_ADMIN".to_string()]);
}

#[tokio::test]
async fn test_forbidden_users_listing() {
    let router = Router::new().route(
        "/rest/security/users",
        get(|| async { (ServerStatus::FORBIDDEN, "no") }),
    );
    let client = common::client_for(router).await;

    let err = client.security().users(vec![]).await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden));
}

#[tokio::test]
async fn test_custom_roles_accept_both_shapes() {
    let router = Router::new().route(
        "/rest/security/custom-roles",
        get(|| async { Json(json!({"CUSTOM_A": ["alice", "bob"], "CUSTOM_B": "carol"})) }),
    );
    let client = common::client_for(router).await;

    let roles = client.security().custom_roles(vec![]).await.unwrap();
    assert_eq!(roles["CUSTOM_A"].as_slice(), &["alice", "bob"]);
    assert_eq!(roles["CUSTOM_B"].as_slice(), &["carol"]);
}

#[tokio::test]
async fn test_saved_query_delete_uses_delete() {
    let deleted = Arc::new(Mutex::new(None));
    let captured = deleted.clone();
    let router = Router::new().route(
        "/rest/sparql/saved-queries",
        get(|| async {
            Json(json!([{"name": "all", "body": "SELECT * WHERE {?s ?p ?o}", "shared": true}]))
        })
        .delete(move |Query(params): Query<HashMap<String, String>>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = params.get("name").cloned();
                ServerStatus::OK
            }
        }),
    );
    let client = common::client_for(router).await;

    let queries = client.saved_queries().list(vec![]).await.unwrap();
    assert_eq!(
        queries,
        vec![SavedQuery {
            name: "all".to_string(),
            body: "SELECT * WHERE {?s ?p ?o}".to_string(),
            shared: true,
        }]
    );

    client.saved_queries().delete("all queries", vec![]).await.unwrap();
    assert_eq!(deleted.lock().unwrap().as_deref(), Some("all queries"));
}

#[tokio::test]
async fn test_idle_recovery_monitor() {
    let router = Router::new().route("/rest/monitor/backup", get(|| async { Json(Value::Null) }));
    let client = common::client_for(router).await;

    assert!(client.monitoring().recovery(vec![]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_transaction_begin_reads_location() {
    let router = Router::new().route(
        "/repositories/movies/transactions",
        post(|| async {
            (
                ServerStatus::CREATED,
                [(
                    header::LOCATION,
                    "http://localhost:7200/repositories/movies/transactions/64a5-9f",
                )],
            )
        }),
    );
    let client = common::client_for(router).await;

    let txid = client.rdf4j().begin_transaction("movies", vec![]).await.unwrap();
    assert_eq!(txid, "64a5-9f");
}
