use qc_review::error::ReviewError;
use qc_review::service::{
    ClientCredentials, Credential, CredentialProvider, HttpQuickCommandApi, JobId,
    QuickCommandApi, RemoteStatus, Submission,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> HttpQuickCommandApi {
    HttpQuickCommandApi::with_client(reqwest::Client::new(), &server.uri(), &server.uri())
}

fn creds() -> ClientCredentials {
    ClientCredentials {
        client_id: "id".into(),
        client_secret: "secret".into(),
        realm: "acme".into(),
    }
}

#[tokio::test]
async fn acquire_credential_reads_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/oidc/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=id"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "tok", "expires_in": 1199})),
        )
        .mount(&server)
        .await;

    let credential = api(&server).acquire_credential(&creds()).await.unwrap();
    assert_eq!(credential.bearer(), "tok");
}

#[tokio::test]
async fn acquire_credential_without_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acme/oidc/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "invalid_client"})),
        )
        .mount(&server)
        .await;

    let err = api(&server).acquire_credential(&creds()).await.unwrap_err();
    assert!(matches!(err, ReviewError::Auth(_)));
}

#[tokio::test]
async fn create_execution_unquotes_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/quick-commands/create-execution/review"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(serde_json::json!({"input_data": "print(1)"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"abc123\""))
        .mount(&server)
        .await;

    let submission = api(&server)
        .create_execution("review", &Credential::new("tok"), "print(1)")
        .await
        .unwrap();
    assert_eq!(submission, Submission::Accepted(JobId::new("abc123")));
}

#[tokio::test]
async fn create_execution_non_200_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/quick-commands/create-execution/review"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let submission = api(&server)
        .create_execution("review", &Credential::new("tok"), "x")
        .await
        .unwrap();
    assert_eq!(submission, Submission::Rejected { status: 429 });
}

#[tokio::test]
async fn execution_status_parses_progress_and_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/quick-commands/callback/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "execution_id": "abc123",
            "progress": {"status": "COMPLETED"},
            "result": "[\"Unused import\"]"
        })))
        .mount(&server)
        .await;

    let report = api(&server)
        .execution_status(&JobId::new("abc123"), &Credential::new("tok"))
        .await
        .unwrap();
    assert_eq!(report.status, RemoteStatus::Completed);
    assert_eq!(report.payload.result_text(), Some("[\"Unused import\"]"));
}

#[tokio::test]
async fn execution_status_non_200_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/quick-commands/callback/abc123"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = api(&server)
        .execution_status(&JobId::new("abc123"), &Credential::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewError::UnexpectedStatus { status: 502, .. }
    ));
}

#[tokio::test]
async fn unreachable_identity_service_is_auth_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base = format!("http://127.0.0.1:{port}");
    let api = HttpQuickCommandApi::with_client(reqwest::Client::new(), &base, &base);

    let err = api.acquire_credential(&creds()).await.unwrap_err();

    assert!(matches!(err, ReviewError::Auth(_)), "unexpected error: {err}");
}
