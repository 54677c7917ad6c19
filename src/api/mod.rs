//! Cliente da API
//!
//! [`Api`] guarda as credenciais da sessão e encaminha as chamadas HTTP ao
//! [`Transport`] injetado, acrescentando `session_id` e/ou `access_token` a
//! cada requisição. Falhas do transporte são traduzidas para
//! `ApiError::OAuthAccess`.
//!
//! Os fluxos de autenticação ficam em [`auth`] e as operações de usuário em
//! [`user`].

pub mod auth;
pub mod mode;
pub mod user;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use crate::config::ApiConfig;
use crate::error::api_error::TRANSPORT_FAILURE_MESSAGE;
use crate::error::{ApiError, ApiResult};
use crate::events::{EventListener, EventListeners};
use crate::transport::{AuthCallback, Body, HttpRequest, Params, ReqwestTransport, Transport};

pub use auth::AuthSession;
pub use mode::AuthMode;

/// Nome do parâmetro que carrega o session id
pub const SESSION_ID_PARAM: &str = "session_id";

/// Nome do parâmetro que carrega o access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Quais credenciais anexar a uma chamada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOptions {
    /// Anexa o session id (obtendo um novo se necessário)
    pub auth: bool,
    /// Anexa o access token (falha se não existir)
    pub token: bool,
}

impl AuthOptions {
    /// Padrão das chamadas: somente o session id
    pub const SESSION: Self = Self { auth: true, token: false };
    /// Nenhuma credencial
    pub const NONE: Self = Self { auth: false, token: false };
    /// Somente o access token
    pub const TOKEN: Self = Self { auth: false, token: true };

    pub fn new(auth: bool, token: bool) -> Self {
        Self { auth, token }
    }
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self::SESSION
    }
}

/// Cliente autenticado da API
pub struct Api {
    transport: Arc<dyn Transport>,
    listeners: EventListeners,
    base_url: String,
    prefix: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: String,
    scope: Vec<String>,
    access_token: Option<String>,
    session_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    acl: Option<BTreeMap<String, Value>>,
    tokens: Option<BTreeSet<String>>,
}

impl Api {
    /// Cria um cliente com o transporte `reqwest` padrão
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.timeout_secs)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Cria um cliente a partir das variáveis de ambiente
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ApiConfig::load()?)
    }

    /// Cria um cliente com um transporte injetado
    pub fn with_transport(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            listeners: EventListeners::new(),
            base_url: config.base_url,
            prefix: config.prefix,
            client_id: config.client_id,
            client_secret: config.client_secret,
            redirect_url: config.redirect_url,
            scope: config.scope,
            access_token: config.access_token,
            session_id: config.session_id,
            username: config.username,
            password: config.password,
            acl: None,
            tokens: None,
        }
    }

    /// Registra um observador de eventos
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.add(Arc::new(listener));
    }

    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        self.add_listener(listener);
        self
    }

    /// URL absoluta para uma rota relativa à base
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn acl(&self) -> Option<&BTreeMap<String, Value>> {
        self.acl.as_ref()
    }

    /// Chaves da ACL da última autenticação
    pub fn tokens(&self) -> Option<&BTreeSet<String>> {
        self.tokens.as_ref()
    }

    /// Retoma uma sessão OAuth obtida fora deste cliente
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// Descarta as credenciais de sessão (session id, access token e ACL)
    pub fn clear_session(&mut self) {
        self.session_id = None;
        self.access_token = None;
        self.acl = None;
        self.tokens = None;
    }

    pub fn mode(&self) -> AuthMode {
        AuthMode::derive(
            self.username.as_deref(),
            self.password.as_deref(),
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        )
    }

    pub fn has_mode(&self) -> bool {
        self.mode().can_refresh()
    }

    /// Anexa as credenciais pedidas aos parâmetros
    ///
    /// Com `auth` o session id atual (ou um novo, via `oauth_session`) é
    /// inserido; com `token` o access token é inserido ou a chamada falha.
    pub async fn build_kwargs(&mut self, params: &mut Params, auth: bool, token: bool) -> ApiResult<()> {
        if auth {
            let session_id = self.get_session_id().await?;
            params.insert(SESSION_ID_PARAM.to_string(), session_id);
        }
        if token {
            let access_token = self.get_access_token()?;
            params.insert(ACCESS_TOKEN_PARAM.to_string(), access_token);
        }
        Ok(())
    }

    pub async fn get(&mut self, url: &str, params: Params, options: AuthOptions) -> ApiResult<Value> {
        self.call(Method::GET, url, params, Body::Empty, options).await
    }

    pub async fn post(&mut self, url: &str, params: Params, body: Body, options: AuthOptions) -> ApiResult<Value> {
        self.call(Method::POST, url, params, body, options).await
    }

    pub async fn put(&mut self, url: &str, params: Params, body: Body, options: AuthOptions) -> ApiResult<Value> {
        self.call(Method::PUT, url, params, body, options).await
    }

    pub async fn delete(&mut self, url: &str, params: Params, options: AuthOptions) -> ApiResult<Value> {
        self.call(Method::DELETE, url, params, Body::Empty, options).await
    }

    async fn call(
        &mut self,
        method: Method,
        url: &str,
        mut params: Params,
        body: Body,
        options: AuthOptions,
    ) -> ApiResult<Value> {
        self.build_kwargs(&mut params, options.auth, options.token).await?;

        let transport = Arc::clone(&self.transport);
        let callback: Option<&mut dyn AuthCallback> = Some(&mut *self);
        let result = if method == Method::GET {
            transport.get(url, params, callback).await
        } else if method == Method::POST {
            transport.post(url, params, body, callback).await
        } else if method == Method::PUT {
            transport.put(url, params, body, callback).await
        } else if method == Method::DELETE {
            transport.delete(url, params, callback).await
        } else {
            let request = HttpRequest::new(method.clone(), url)
                .with_params(params)
                .with_body(body);
            transport.execute(request, callback).await
        };

        translate_failure(&method, url, result)
    }

    /// Executa a requisição no transporte, usando o próprio cliente como
    /// callback de desafio de autenticação
    ///
    /// Qualquer falha do transporte vira `OAuthAccess`; erros do callback e
    /// respostas bem sucedidas passam sem alteração.
    pub async fn request(&mut self, request: HttpRequest) -> ApiResult<Value> {
        self.dispatch(request, true).await
    }

    /// Como `request`, mas sem callback quando `refresh` é falso
    pub(crate) async fn dispatch(&mut self, request: HttpRequest, refresh: bool) -> ApiResult<Value> {
        let transport = Arc::clone(&self.transport);
        let method = request.method.clone();
        let url = request.url.clone();

        let callback: Option<&mut dyn AuthCallback> = if refresh { Some(&mut *self) } else { None };
        let result = transport.execute(request, callback).await;

        translate_failure(&method, &url, result)
    }
}

fn translate_failure(method: &Method, url: &str, result: ApiResult<Value>) -> ApiResult<Value> {
    match result {
        Err(ApiError::Transport(e)) => {
            tracing::warn!(%method, %url, status = ?e.status(), "Request failed: {}", e);
            Err(ApiError::oauth_access(TRANSPORT_FAILURE_MESSAGE))
        }
        other => other,
    }
}

#[async_trait]
impl AuthCallback for Api {
    async fn on_auth_challenge(&mut self, params: &mut Params) -> ApiResult<()> {
        self.auth_callback(params).await
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.base_url)
            .field("prefix", &self.prefix)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("redirect_url", &self.redirect_url)
            .field("scope", &self.scope)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("session_id", &self.session_id.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tokens", &self.tokens)
            .field("mode", &self.mode())
            .field("listeners", &self.listeners)
            .finish()
    }
}
