//! HTTP client for the registration backend.

mod client;
mod error;
mod types;

pub use client::RegistrationClient;
pub use error::ClientError;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_core::{
        AccountBackend, AnalyticsEvent, AnalyticsSink, BackendError, ExternalIds, Field,
        FieldMap, OutboundRegistration, ReferenceCategory, ReferenceDataService,
        VerificationBackend,
    };
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_test_client(mock_server: &MockServer) -> RegistrationClient {
        RegistrationClient::new(mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn registration() -> OutboundRegistration {
        let mut fields = FieldMap::new();
        fields.set(Field::Email, "maria@example.com".into());
        fields.set(Field::Password, "abcdefghij".into());
        fields.set(Field::Mobile, "0917 123 4567".into());
        OutboundRegistration::build(&fields, &ExternalIds::from_query("job_id=J-1"))
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_send_verification_email() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/verification/send"))
            .and(body_json(serde_json::json!({ "email": "maria@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert_ok!(client.send_verification_email("maria@example.com").await);
    }

    #[tokio::test]
    async fn test_check_email_verified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/verification/check"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "verified": false } })),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert!(!assert_ok!(client.check_email_verified("maria@example.com").await));
    }

    #[tokio::test]
    async fn test_check_without_data_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/verification/check"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = assert_err!(client.check_email_verified("maria@example.com").await);
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_create_account_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .and(body_partial_json(serde_json::json!({
                "email": "maria@example.com",
                "mobile": "+639171234567",
                "job_id": "J-1"
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "data": { "account_id": "acc-9" } })),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let created = assert_ok!(client.create_account(&registration()).await);
        assert_eq!(created.account_id.as_deref(), Some("acc-9"));
    }

    #[tokio::test]
    async fn test_create_account_rejected_with_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(serde_json::json!({ "error": "Email already registered" })),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = assert_err!(client.create_account(&registration()).await);
        assert_eq!(err, BackendError::Rejected("Email already registered".into()));
    }

    #[tokio::test]
    async fn test_error_field_wins_on_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "error": "Invalid phone number" })),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = assert_err!(client.create_account(&registration()).await);
        assert_eq!(err, BackendError::Rejected("Invalid phone number".into()));
    }

    #[tokio::test]
    async fn test_bare_server_error_is_transport() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = assert_err!(client.create_account(&registration()).await);
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport() {
        let client = RegistrationClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = assert_err!(client.send_verification_email("maria@example.com").await);
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_reference_data_with_parent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/reference/city"))
            .and(query_param("parent", "davao del sur"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "id": "davao-city", "name": "Davao City" },
                    { "id": "digos", "name": "Digos" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let records = assert_ok!(
            client
                .get_reference_data(ReferenceCategory::City, Some("davao del sur"))
                .await
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Digos");
    }

    #[tokio::test]
    async fn test_reference_data_without_data_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/reference/province"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let records = assert_ok!(
            client
                .get_reference_data(ReferenceCategory::Province, None)
                .await
        );
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_notify_posts_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .and(body_partial_json(serde_json::json!({
                "kind": "step_started",
                "step_key": "registration_account"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let event = AnalyticsEvent::step_started("registration_account");
        assert_ok!(client.notify(&event).await);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client =
            RegistrationClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
