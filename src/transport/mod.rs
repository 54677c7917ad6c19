//! Camada de transporte HTTP
//!
//! O cliente da API não fala HTTP diretamente: ele recebe um [`Transport`]
//! injetado. A implementação padrão é [`ReqwestTransport`]; testes e
//! integrações podem fornecer outra.
//!
//! O transporte também é dono do tratamento de desafio de autenticação:
//! quando a resposta tem um status de [`AUTH_CHALLENGE_STATUSES`] e um
//! [`AuthCallback`] foi informado, o callback atualiza os parâmetros da
//! requisição e ela é reenviada uma única vez.

pub mod http;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use crate::error::ApiResult;

pub use http::ReqwestTransport;

/// Parâmetros enviados na query string
pub type Params = HashMap<String, String>;

/// Status HTTP tratados como desafio de autenticação
pub const AUTH_CHALLENGE_STATUSES: &[u16] = &[401, 403, 440, 499];

pub fn is_auth_challenge(status: u16) -> bool {
    AUTH_CHALLENGE_STATUSES.contains(&status)
}

/// Arquivo ou campo de um corpo multipart
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartField {
    pub name: String,
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl MultipartField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content: value.into().into_bytes(),
        }
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content,
        }
    }
}

/// Corpo de uma requisição POST/PUT
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Bytes enviados como estão
    Raw(Vec<u8>),
    /// Valor serializado como JSON
    Json(Value),
    /// Formulário multipart
    Multipart(Vec<MultipartField>),
}

/// Requisição entregue ao transporte
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Params,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Params::new(),
            body: Body::Empty,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// Chamado pelo transporte quando o servidor responde com um desafio de
/// autenticação. Deve renovar as credenciais dentro de `params`.
#[async_trait]
pub trait AuthCallback: Send {
    async fn on_auth_challenge(&mut self, params: &mut Params) -> ApiResult<()>;
}

/// Capacidade HTTP injetada no cliente
///
/// Falhas HTTP e de rede devem ser reportadas como `ApiError::Transport`;
/// erros vindos do callback devem ser repassados sem alteração.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: HttpRequest,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value>;

    async fn get(
        &self,
        url: &str,
        params: Params,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value> {
        let request = HttpRequest::new(Method::GET, url).with_params(params);
        self.execute(request, auth_callback).await
    }

    async fn post(
        &self,
        url: &str,
        params: Params,
        body: Body,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value> {
        let request = HttpRequest::new(Method::POST, url)
            .with_params(params)
            .with_body(body);
        self.execute(request, auth_callback).await
    }

    async fn put(
        &self,
        url: &str,
        params: Params,
        body: Body,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value> {
        let request = HttpRequest::new(Method::PUT, url)
            .with_params(params)
            .with_body(body);
        self.execute(request, auth_callback).await
    }

    async fn delete(
        &self,
        url: &str,
        params: Params,
        auth_callback: Option<&mut dyn AuthCallback>,
    ) -> ApiResult<Value> {
        let request = HttpRequest::new(Method::DELETE, url).with_params(params);
        self.execute(request, auth_callback).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_challenge_statuses() {
        assert!(is_auth_challenge(401));
        assert!(is_auth_challenge(403));
        assert!(is_auth_challenge(440));
        assert!(is_auth_challenge(499));
        assert!(!is_auth_challenge(200));
        assert!(!is_auth_challenge(404));
        assert!(!is_auth_challenge(500));
    }

    #[test]
    fn test_request_builder() {
        let mut params = Params::new();
        params.insert("a".to_string(), "1".to_string());

        let request = HttpRequest::new(Method::PUT, "http://localhost/x")
            .with_params(params.clone())
            .with_body(Body::Json(serde_json::json!({"k": "v"})));

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.url, "http://localhost/x");
        assert_eq!(request.params, params);
        assert!(matches!(request.body, Body::Json(_)));
    }

    #[test]
    fn test_multipart_field_constructors() {
        let text = MultipartField::text("name", "value");
        assert_eq!(text.filename, None);
        assert_eq!(text.content, b"value".to_vec());

        let file = MultipartField::file("upload", "a.txt", vec![1, 2, 3]);
        assert_eq!(file.filename.as_deref(), Some("a.txt"));
        assert_eq!(Body::default(), Body::Empty);
    }
}
