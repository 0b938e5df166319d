//! Router-level tests: webhook endpoints, health and the admin surface.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use voicegate_rs::api::handlers::AppState;
use voicegate_rs::api::ApiServer;
use voicegate_rs::audio::AudioResolver;
use voicegate_rs::config::Config;
use voicegate_rs::quota::QuotaEnforcer;
use voicegate_rs::redemption::RedemptionFlow;
use voicegate_rs::store::CodeStore;
use voicegate_rs::telephony::{MockDialer, OutboundDialer};

struct TestApp {
    server: ApiServer,
    store: CodeStore,
    dialer: Arc<MockDialer>,
    _dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}/gate.db", dir.path().display());
    let store = CodeStore::connect(&db_url).await.unwrap();
    std::fs::create_dir_all(dir.path().join("audio")).unwrap();

    let mut config = Config::default();
    config.telephony.from_number = Some("+815000000000".to_string());
    config.storage.seed_path = dir
        .path()
        .join("serial_codes.json")
        .to_string_lossy()
        .into_owned();
    config.storage.audio_dir = dir.path().join("audio").to_string_lossy().into_owned();

    let dialer = Arc::new(MockDialer::new());
    let dyn_dialer: Arc<dyn OutboundDialer> = dialer.clone();
    let enforcer = QuotaEnforcer::new(store.db.clone());
    let flow = RedemptionFlow::new(
        store.clone(),
        enforcer,
        dyn_dialer,
        AudioResolver::new(None),
        &config,
    );

    let state = Arc::new(AppState {
        store: store.clone(),
        flow,
        config,
    });

    TestApp {
        server: ApiServer::new(state, "127.0.0.1:0".to_string()),
        store,
        dialer,
        _dir: dir,
    }
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;

    let response = app
        .server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("\"ok\""));
}

#[tokio::test]
async fn voice_prompts_for_digits() {
    let app = test_app().await;

    let response = app
        .server
        .router()
        .oneshot(Request::builder().uri("/voice").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let body = body_string(response).await;
    assert!(body.contains("numDigits=\"4\""));
    assert!(body.contains("action=\"/check_code\""));
    assert!(body.contains("シリアルコードを入力してください"));
}

#[tokio::test]
async fn check_code_dispatches_and_confirms() {
    let app = test_app().await;
    app.store.upsert("1234", "hayase.wav", 3, 0).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check_code")
                .header(header::HOST, "voice.example.com")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("Digits=1234&From=%2B819012345678"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("認証に成功しました"));

    let calls = app.dialer.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, "+819012345678");
    assert_eq!(calls[0].callback_url, "http://voice.example.com/fulfill/1234");
}

#[tokio::test]
async fn check_code_behind_secure_proxy_uses_https_callback() {
    let app = test_app().await;
    app.store.upsert("1234", "hayase.wav", 3, 0).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check_code")
                .header(header::HOST, "voice.example.com")
                .header("x-forwarded-proto", "https")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("Digits=1234&From=%2B819012345678"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = app.dialer.calls().await;
    assert_eq!(calls[0].callback_url, "https://voice.example.com/fulfill/1234");
}

#[tokio::test]
async fn check_code_rejects_unknown_code() {
    let app = test_app().await;

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check_code")
                .header(header::HOST, "voice.example.com")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("Digits=9999&From=%2B819012345678"))
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains("見つかりません"));
    assert_eq!(app.dialer.call_count().await, 0);
}

#[tokio::test]
async fn fulfill_plays_audio_and_records_use() {
    let app = test_app().await;
    app.store.upsert("1234", "hayase.wav", 3, 0).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/fulfill/1234")
                .header(header::HOST, "voice.example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("<Play>https://voice.example.com/audio/hayase.wav</Play>"));
    assert!(body.contains("ご利用ありがとうございました"));

    let code = app.store.lookup("1234").await.unwrap().unwrap();
    assert_eq!(code.usage_count, 1);
}

#[tokio::test]
async fn admin_lists_codes() {
    let app = test_app().await;
    app.store.upsert("1234", "hayase.wav", 3, 1).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .uri("/admin/codes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body[0]["code"], "1234");
    assert_eq!(body[0]["usage_count"], 1);
    assert_eq!(body[0]["max_uses"], 3);
}

#[tokio::test]
async fn admin_resets_one_code() {
    let app = test_app().await;
    app.store.upsert("1234", "hayase.wav", 3, 2).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/codes/1234/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["usage_count"], 0);
}

#[tokio::test]
async fn admin_reset_unknown_code_is_404() {
    let app = test_app().await;

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/codes/0000/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_resets_all_codes() {
    let app = test_app().await;
    app.store.upsert("1111", "a.wav", 3, 1).await.unwrap();
    app.store.upsert("2222", "b.wav", 3, 3).await.unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/reset_all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["reset"], 2);
}

#[tokio::test]
async fn admin_syncs_from_seed_file() {
    let app = test_app().await;
    app.store.upsert("1234", "old.wav", 3, 1).await.unwrap();

    let seed_path = app._dir.path().join("serial_codes.json");
    std::fs::write(
        &seed_path,
        r#"{
            "1234": { "audio_url": "new.wav", "max_uses": 5 },
            "5678": { "audio_url": "b.wav" }
        }"#,
    )
    .unwrap();

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["created"], 1);
    assert_eq!(body["updated"], 1);

    // Round-trip: synced fields readable, pre-existing count untouched
    let code = app.store.lookup("1234").await.unwrap().unwrap();
    assert_eq!(code.audio_url, "new.wav");
    assert_eq!(code.max_uses, 5);
    assert_eq!(code.usage_count, 1);
}

#[tokio::test]
async fn admin_sync_without_seed_file_is_404() {
    let app = test_app().await;

    let response = app
        .server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
