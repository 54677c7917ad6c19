//! Fluxos de autenticação
//!
//! - Login direto com usuário e senha (`login`)
//! - OAuth2 authorization code: URL de autorização (`oauth_authorize`),
//!   troca do code por access token (`oauth_access`) e abertura de sessão
//!   com o token (`oauth_session`)
//! - Renovação da sessão quando o servidor responde com desafio de
//!   autenticação (`auth_callback`)

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;
use crate::error::api_error::{MISSING_TOKEN_MESSAGE, SESSION_EXPIRED_MESSAGE};
use crate::error::{ApiError, ApiResult};
use crate::events::ApiEvent;
use crate::transport::{Body, HttpRequest, Params};
use super::{Api, AuthOptions, ACCESS_TOKEN_PARAM, SESSION_ID_PARAM};

pub const LOGIN_PATH: &str = "omni/login.json";
pub const AUTHORIZE_PATH: &str = "oauth/authorize";
pub const ACCESS_TOKEN_PATH: &str = "omni/oauth/access_token";
pub const START_SESSION_PATH: &str = "omni/oauth/start_session";

/// Dados de sessão devolvidos pelo login e pelo start_session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub acl: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AuthSession {
    pub fn from_value(value: &Value) -> ApiResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| ApiError::parse_error(format!("Malformed auth response: {}", e)))
    }
}

impl Api {
    /// Session id atual ou um novo obtido com `oauth_session`
    pub async fn get_session_id(&mut self) -> ApiResult<String> {
        if let Some(session_id) = self.session_id.clone().filter(|s| !s.is_empty()) {
            return Ok(session_id);
        }
        self.oauth_session().await
    }

    /// Access token atual; nunca tenta renovar
    pub fn get_access_token(&self) -> ApiResult<String> {
        self.access_token
            .clone()
            .ok_or_else(|| ApiError::oauth_access(MISSING_TOKEN_MESSAGE))
    }

    /// Renova a sessão e grava o novo session id em `params`
    ///
    /// Falha com `Access` quando não há modo de autenticação configurado.
    pub async fn auth_callback(&mut self, params: &mut Params) -> ApiResult<()> {
        if !self.has_mode() {
            return Err(ApiError::access(SESSION_EXPIRED_MESSAGE));
        }

        tracing::info!(mode = %self.mode(), "Session rejected by server, renewing");

        self.session_id = None;
        let session_id = self.get_session_id().await?;
        params.insert(SESSION_ID_PARAM.to_string(), session_id);
        Ok(())
    }

    /// Login direto
    ///
    /// Argumentos ausentes usam o usuário e a senha configurados.
    pub async fn login(&mut self, username: Option<&str>, password: Option<&str>) -> ApiResult<String> {
        let username = username
            .map(str::to_string)
            .or_else(|| self.username.clone())
            .ok_or_else(|| ApiError::access("No username available for direct login"))?;
        let password = password
            .map(str::to_string)
            .or_else(|| self.password.clone())
            .ok_or_else(|| ApiError::access("No password available for direct login"))?;

        tracing::info!(username = %username, "Logging in");

        let mut params = Params::new();
        params.insert("username".to_string(), username);
        params.insert("password".to_string(), password);

        let url = self.url(LOGIN_PATH);
        let contents = self.post(&url, params, Body::Empty, AuthOptions::NONE).await?;

        self.store_session(contents)
    }

    /// URL de autorização OAuth2; não faz nenhuma chamada de rede
    #[doc(alias = "oauth_autorize")]
    pub fn oauth_authorize(&self) -> ApiResult<String> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ApiError::config_error("client_id is required to authorize"))?;

        let base = self.url(&format!("{}{}", self.prefix, AUTHORIZE_PATH));
        let scope = self.scope.join(" ");

        let url = Url::parse_with_params(
            &base,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ApiError::config_error(format!("Invalid authorize URL {}: {}", base, e)))?;

        Ok(url.to_string())
    }

    /// Troca o authorization code por um access token
    pub async fn oauth_access(&mut self, code: &str) -> ApiResult<String> {
        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id.clone(), secret.clone()),
            _ => {
                return Err(ApiError::config_error(
                    "client_id and client_secret are required for the token exchange",
                ))
            }
        };

        let mut params = Params::new();
        params.insert("client_id".to_string(), client_id);
        params.insert("client_secret".to_string(), client_secret);
        params.insert("grant_type".to_string(), "authorization_code".to_string());
        params.insert("redirect_uri".to_string(), self.redirect_url.clone());
        params.insert("code".to_string(), code.to_string());

        let url = self.url(ACCESS_TOKEN_PATH);
        let contents = self.post(&url, params, Body::Empty, AuthOptions::NONE).await?;

        let access_token = contents
            .get(ACCESS_TOKEN_PARAM)
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::parse_error("Token response without access_token"))?
            .to_string();

        tracing::info!("Access token obtained");

        self.access_token = Some(access_token.clone());
        self.listeners.trigger(ApiEvent::AccessToken(access_token.clone()));
        Ok(access_token)
    }

    /// Abre uma sessão usando o access token
    pub async fn oauth_session(&mut self) -> ApiResult<String> {
        // Equivale a get(auth = false, token = true), sem build_kwargs
        // (que depende deste método) e sem renovar a sessão num desafio,
        // o que voltaria a chamar oauth_session.
        let mut params = Params::new();
        params.insert(ACCESS_TOKEN_PARAM.to_string(), self.get_access_token()?);

        let url = self.url(START_SESSION_PATH);
        let request = HttpRequest::new(Method::GET, url).with_params(params);
        let contents = self.dispatch(request, false).await?;

        self.store_session(contents)
    }

    /// Guarda usuário, ACL e session id e emite o evento `auth`
    fn store_session(&mut self, contents: Value) -> ApiResult<String> {
        let session = AuthSession::from_value(&contents)?;
        let session_id = session
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::parse_error("Auth response without session_id"))?;
        let acl = session.acl.unwrap_or_default();

        self.username = session.username;
        self.tokens = Some(acl.keys().cloned().collect());
        self.acl = Some(acl);
        self.session_id = Some(session_id.clone());

        tracing::info!(
            username = ?self.username,
            tokens = self.tokens.as_ref().map_or(0, |t| t.len()),
            "Session started"
        );

        self.listeners.trigger(ApiEvent::Auth(contents));
        Ok(session_id)
    }
}
