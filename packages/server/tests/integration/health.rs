use crate::common::{MemoryRecords, TestApp, TestOptions, routes};

#[tokio::test]
async fn healthy_when_database_answers() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "healthy");
}

#[tokio::test]
async fn unavailable_when_ping_fails() {
    let app = TestApp::spawn_with(TestOptions {
        records: MemoryRecords {
            fail_ping: true,
            ..Default::default()
        },
        ..Default::default()
    })
    .await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 503);
    assert_eq!(res.body["status"], "unhealthy");
}

#[tokio::test]
async fn openapi_document_lists_component_route() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    let paths = &res.body["paths"];
    let documented = ["/api/v1/components", "/api/v1/components/"]
        .iter()
        .any(|p| paths[*p]["post"].is_object());
    assert!(documented, "{}", res.text);
}
