//! Contract tests for the backend client against a mock HTTP server.

use duewatch_backend::{BackendClient, BackendConfig, BackendError, TaskRecord};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BackendClient {
    BackendClient::new(BackendConfig {
        base_url: server.uri(),
        api_key: "deploy-key".to_owned(),
        sensor_url: Some(format!("{}/sensors/latest", server.uri())),
        timeout_secs: 5,
    })
    .expect("client")
}

#[tokio::test]
async fn list_tasks_reads_wrapped_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploy-key/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "title": "Water plants", "date": "2024-01-01 09:00"},
                {"id": "2", "title": "Feed cat", "date": "2024-01-01T18:30:00Z", "status": "open"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client_for(&server).list_tasks().await.expect("list");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, "1");
    assert_eq!(tasks[1].status.as_deref(), Some("open"));
}

#[tokio::test]
async fn list_tasks_maps_server_errors_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploy-key/exec"))
        .respond_with(ResponseTemplate::new(500).set_body_string("script error"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tasks().await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "script error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn lookups_use_get_by_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploy-key/exec"))
        .and(query_param("getBy", "id"))
        .and(query_param("id", "9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 9, "title": "Call mum", "date": "2024-02-02 10:00"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deploy-key/exec"))
        .and(query_param("getBy", "status"))
        .and(query_param("status", "done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deploy-key/exec"))
        .and(query_param("getBy", "date"))
        .and(query_param("start", "2024-02-01"))
        .and(query_param("end", "2024-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "title": "Call mum", "date": "2024-02-02 10:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let task = client.get_task("9").await.expect("get").expect("present");
    assert_eq!(task.title, "Call mum");
    assert!(client.tasks_by_status("done").await.expect("status").is_empty());
    let february = client
        .tasks_by_date("2024-02-01", "2024-02-29")
        .await
        .expect("date");
    assert_eq!(february.len(), 1);
}

#[tokio::test]
async fn create_posts_title_and_date() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy-key/exec"))
        .and(query_param("action", "post"))
        .and(body_json(json!({"title": "Water plants", "date": "2024-01-01 09:00"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12, "title": "Water plants", "date": "2024-01-01 09:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server)
        .create_task("Water plants", "2024-01-01 09:00")
        .await
        .expect("create");
    assert_eq!(created.map(|t| t.id).as_deref(), Some("12"));
}

#[tokio::test]
async fn update_sends_all_columns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy-key/exec"))
        .and(query_param("action", "put"))
        .and(body_json(json!({
            "id": "4", "title": "Stretch", "date": "2024-03-03 07:00", "status": "done"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let record = TaskRecord {
        id: "4".into(),
        title: "Stretch".into(),
        date: "2024-03-03 07:00".into(),
        status: Some("done".into()),
    };
    client_for(&server).update_task(&record).await.expect("update");
}

#[tokio::test]
async fn delete_sends_numeric_id_as_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy-key/exec"))
        .and(query_param("action", "delete"))
        .and(header("content-type", "text/plain"))
        .and(body_string(r#"{"id":42}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_task("42").await.expect("delete");
}

#[tokio::test]
async fn delete_reports_in_body_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy-key/exec"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "gone"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).delete_task("abc").await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(ref m) if m == "gone"));
}

#[tokio::test]
async fn sensors_default_missing_channels_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sensors/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": 24.5, "humidity": "55", "light": 310
        })))
        .mount(&server)
        .await;

    let reading = client_for(&server).fetch_sensors().await.expect("sensors");
    assert_eq!(reading.temperature, 24.5);
    assert_eq!(reading.humidity, 55.0);
    assert_eq!(reading.lumen, 310.0);
    assert_eq!(reading.pm25, 0.0);
}

#[tokio::test]
async fn sensors_without_endpoint_is_config_error() {
    let client = BackendClient::new(BackendConfig::default()).expect("client");
    let err = client.fetch_sensors().await.unwrap_err();
    assert!(matches!(err, BackendError::Config(_)));
}
