//! Transporte padrão baseado em `reqwest`

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use crate::error::{ApiError, ApiResult, TransportError};
use super::{is_auth_challenge, AuthCallback, Body, HttpRequest, MultipartField, Transport};

/// Timeout de conexão, em segundos
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Transporte HTTP assíncrono sobre `reqwest`
///
/// # Timeouts
///
/// - Total: configurável (30s por padrão)
/// - Connect: 5s
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::config_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Usa um `reqwest::Client` já configurado
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: &HttpRequest) -> Result<Response, TransportError> {
        let builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.params);

        let builder = match &request.body {
            Body::Empty => builder,
            Body::Raw(bytes) => builder.body(bytes.clone()),
            Body::Json(value) => builder.json(value),
            Body::Multipart(fields) => builder.multipart(build_form(fields)),
        };

        Ok(builder.send().await?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        mut request: HttpRequest,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value> {
        tracing::debug!("{} {}", request.method, request.url);

        let mut response = self.send(&request).await?;
        let status = response.status().as_u16();

        if is_auth_challenge(status) {
            if let Some(callback) = auth_callback {
                tracing::info!(status, url = %request.url, "Auth challenge received, refreshing credentials");
                callback.on_auth_challenge(&mut request.params).await?;
                response = self.send(&request).await?;
            }
        }

        read_response(response).await
    }
}

fn build_form(fields: &[MultipartField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| {
        let part = Part::bytes(field.content.clone());
        let part = match &field.filename {
            Some(filename) => part.file_name(filename.clone()),
            None => part,
        };
        form.part(field.name.clone(), part)
    })
}

async fn read_response(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let body = response.text().await.map_err(TransportError::from)?;

    tracing::debug!("Response status: {}, body length: {}", status, body.len());

    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    Ok(decode_body(&body))
}

/// Corpo vazio vira `null`; JSON inválido é devolvido como string
pub fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Params;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Callback que troca o session_id e conta as chamadas
    struct RenewSession {
        calls: usize,
    }

    #[async_trait]
    impl AuthCallback for RenewSession {
        async fn on_auth_challenge(&mut self, params: &mut Params) -> ApiResult<()> {
            self.calls += 1;
            params.insert("session_id".to_string(), "fresh".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("  \n"), Value::Null);
        assert_eq!(decode_body(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(decode_body("plain text"), json!("plain text"));
    }

    #[tokio::test]
    async fn test_get_sends_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("session_id", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let mut params = Params::new();
        params.insert("session_id".to_string(), "abc".to_string());

        let result = transport
            .get(&format!("{}/items", server.uri()), params, None)
            .await
            .unwrap();

        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(body_json(json!({"name": "x"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let result = transport
            .post(
                &format!("{}/items", server.uri()),
                Params::new(),
                Body::Json(json!({"name": "x"})),
                None,
            )
            .await
            .unwrap();

        assert_eq!(result, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let error = transport
            .delete(&format!("{}/items/1", server.uri()), Params::new(), None)
            .await
            .unwrap_err();

        match error {
            ApiError::Transport(TransportError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auth_challenge_retries_once_with_callback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(query_param("session_id", "stale"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(query_param("session_id", "fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let mut callback = RenewSession { calls: 0 };
        let mut params = Params::new();
        params.insert("session_id".to_string(), "stale".to_string());

        let result = transport
            .get(&format!("{}/me", server.uri()), params, Some(&mut callback))
            .await
            .unwrap();

        assert_eq!(result, json!({"id": 7}));
        assert_eq!(callback.calls, 1);
    }

    #[tokio::test]
    async fn test_auth_challenge_without_callback_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let error = transport
            .get(&format!("{}/me", server.uri()), Params::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ApiError::Transport(TransportError::Status { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_second_challenge_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(2)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(5).unwrap();
        let mut callback = RenewSession { calls: 0 };

        let error = transport
            .get(&format!("{}/me", server.uri()), Params::new(), Some(&mut callback))
            .await
            .unwrap_err();

        assert_eq!(callback.calls, 1);
        assert!(matches!(error, ApiError::Transport(_)));
    }
}
