// Tests for the Sheets v4 client and the service-account token exchange
// Uses mockito for HTTP mocking

use mockito::{Matcher, Server};
use serde_json::json;
use sheet_geocoder::auth::{AuthError, ServiceAccountKey, SHEETS_SCOPES};
use sheet_geocoder::sheets::{CellValue, ColumnSource, GoogleSheetsClient, RangeSink, SheetError};
use std::io::Write;

fn create_test_client(server: &Server) -> GoogleSheetsClient {
    GoogleSheetsClient::with_base_url(server.url(), "spreadsheet-123", "Sheet1", "test-token")
}

#[tokio::test]
async fn test_read_column_returns_all_cells() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock(
            "GET",
            Matcher::Regex(r"^/v4/spreadsheets/spreadsheet-123/values/.*Sheet1.*J:J".to_string()),
        )
        .match_query(Matcher::UrlEncoded("majorDimension".into(), "COLUMNS".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "range": "Sheet1!J1:J4",
                "majorDimension": "COLUMNS",
                "values": [["Full Address", "1 Main St", "", "2 Oak Ave"]]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = create_test_client(&server);
    let values = client.read_column("j").await.unwrap();

    assert_eq!(values, vec!["Full Address", "1 Main St", "", "2 Oak Ave"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_empty_column() {
    let mut server = Server::new_async().await;

    // The API omits "values" entirely when the range is empty
    let mock = server
        .mock("GET", Matcher::Regex(r"^/v4/spreadsheets/".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{ "range": "Sheet1!J1:J1000", "majorDimension": "COLUMNS" }"#)
        .create_async()
        .await;

    let client = create_test_client(&server);
    assert!(client.read_column("J").await.unwrap().is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_column_encodes_sheet_name() {
    let mut server = Server::new_async().await;

    // An unescaped '#' would cut the range off as a URL fragment
    let mock = server
        .mock(
            "GET",
            Matcher::Regex(r"^/v4/spreadsheets/spreadsheet-123/values/'Sites%20%232'!J:J$".to_string()),
        )
        .match_query(Matcher::UrlEncoded("majorDimension".into(), "COLUMNS".into()))
        .with_status(200)
        .with_body(json!({ "values": [["Full Address", "9 Elm St"]] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client =
        GoogleSheetsClient::with_base_url(server.url(), "spreadsheet-123", "Sites #2", "test-token");
    let values = client.read_column("J").await.unwrap();

    assert_eq!(values, vec!["Full Address", "9 Elm St"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_rejects_invalid_column() {
    let server = Server::new_async().await;
    let client = create_test_client(&server);

    let result = client.read_column("J1").await;
    assert!(matches!(result, Err(SheetError::Range(_))));
}

#[tokio::test]
async fn test_write_range_sends_rows_payload() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock(
            "PUT",
            Matcher::Regex(r"^/v4/spreadsheets/spreadsheet-123/values/.*Sheet1.*!G2:G4".to_string()),
        )
        .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "range": "'Sheet1'!G2:G4",
            "majorDimension": "ROWS",
            "values": [[41.8], [null], [37.5]]
        })))
        .with_status(200)
        .with_body(r#"{ "updatedCells": 2 }"#)
        .create_async()
        .await;

    let client = create_test_client(&server);
    let values = vec![
        vec![CellValue::Number(41.8)],
        vec![CellValue::Empty],
        vec![CellValue::Number(37.5)],
    ];
    client.write_range("G2:G4", &values).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_write_range_permission_denied() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PUT", Matcher::Regex(r"^/v4/spreadsheets/".to_string()))
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{ "error": { "code": 403, "status": "PERMISSION_DENIED" } }"#)
        .create_async()
        .await;

    let client = create_test_client(&server);
    let result = client
        .write_range("A2:A2", &[vec![CellValue::Text("Cook".to_string())]])
        .await;

    match result {
        Err(SheetError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 403);
            assert!(body.contains("PERMISSION_DENIED"));
        }
        other => panic!("Expected Status error, got {other:?}"),
    }

    mock.assert_async().await;
}

fn fixture_key(server: &Server) -> ServiceAccountKey {
    let mut key = ServiceAccountKey::from_file("tests/fixtures/service_account.json").unwrap();
    key.token_uri = format!("{}/token", server.url());
    key
}

#[tokio::test]
async fn test_fetch_access_token() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "grant_type".into(),
                "urn:ietf:params:oauth:grant-type:jwt-bearer".into(),
            ),
            Matcher::Regex("assertion=".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{ "access_token": "ya29.token", "expires_in": 3599, "token_type": "Bearer" }"#)
        .create_async()
        .await;

    let key = fixture_key(&server);
    let token = key.fetch_access_token(&SHEETS_SCOPES).await.unwrap();

    assert_eq!(token, "ya29.token");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_access_token_rejected() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{ "error": "invalid_grant" }"#)
        .create_async()
        .await;

    let key = fixture_key(&server);
    let result = key.fetch_access_token(&SHEETS_SCOPES).await;

    match result {
        Err(AuthError::TokenRejected { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("Expected TokenRejected, got {other:?}"),
    }

    mock.assert_async().await;
}

#[test]
fn test_key_file_from_tempfile() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "client_email": "svc@example.iam.gserviceaccount.com", "private_key": "pem" }}"#
    )
    .unwrap();

    let key = ServiceAccountKey::from_file(file.path()).unwrap();
    assert_eq!(key.client_email, "svc@example.iam.gserviceaccount.com");
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
}

#[test]
fn test_missing_key_file() {
    let result = ServiceAccountKey::from_file("/nonexistent/key.json");
    match result {
        Err(AuthError::KeyFile { path, .. }) => assert_eq!(path, "/nonexistent/key.json"),
        other => panic!("Expected KeyFile error, got {other:?}"),
    }
}
