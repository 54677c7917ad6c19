use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::error::ApiResult;

/// URL base usada quando nenhuma outra é configurada
pub const BASE_URL: &str = "https://graph.facebook.com/";

/// URL de redirecionamento usada como fallback no fluxo OAuth2
pub const REDIRECT_URL: &str = "http://localhost:8080/oauth";

/// Permissões usadas para montar o scope do OAuth2
pub const SCOPE: &[&str] = &[
    "base",
    "base.user",
    "base.admin",
    "foundation.store.list",
    "foundation.web.subscribe",
];

/// Timeout total padrão das requisições, em segundos
pub const TIMEOUT_SECS: u64 = 30;

/// Prefixo das variáveis de ambiente lidas pelo crate
pub const ENV_PREFIX: &str = "FACEBOOK";

/// Valores crus como vêm das fontes de configuração
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: Option<String>,
    scope: Option<String>,
    base_url: Option<String>,
    prefix: Option<String>,
    access_token: Option<String>,
    session_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
}

/// Configuração do cliente da API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: String,
    pub scope: Vec<String>,
    pub base_url: String,
    pub prefix: String,
    pub access_token: Option<String>,
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_url: REDIRECT_URL.to_string(),
            scope: SCOPE.iter().map(|s| s.to_string()).collect(),
            base_url: BASE_URL.to_string(),
            prefix: String::new(),
            access_token: None,
            session_id: None,
            username: None,
            password: None,
            timeout_secs: TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Carrega a configuração: arquivo opcional `config/facebook` seguido das
    /// variáveis `FACEBOOK_*`. Um `.env` no diretório atual é lido antes.
    pub fn load() -> ApiResult<Self> {
        if cfg!(not(test)) && Path::new(".env").exists() {
            if let Err(e) = dotenvy::dotenv() {
                tracing::warn!("Failed to load .env: {}", e);
            }
        }

        let settings = Config::builder()
            .add_source(File::with_name("config/facebook").required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;
        let config = Self::from_raw(raw);

        tracing::debug!(
            base_url = %config.base_url,
            mode_ready = config.client_id.is_some() || config.username.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn from_raw(raw: RawSettings) -> Self {
        let defaults = Self::default();

        Self {
            client_id: non_empty(raw.client_id),
            client_secret: non_empty(raw.client_secret),
            redirect_url: non_empty(raw.redirect_url).unwrap_or(defaults.redirect_url),
            scope: non_empty(raw.scope)
                .map(|s| parse_scope(&s))
                .unwrap_or(defaults.scope),
            base_url: normalize_base_url(
                &non_empty(raw.base_url).unwrap_or(defaults.base_url),
            ),
            prefix: raw.prefix.unwrap_or(defaults.prefix),
            access_token: non_empty(raw.access_token),
            session_id: non_empty(raw.session_id),
            username: non_empty(raw.username),
            password: non_empty(raw.password),
            timeout_secs: raw.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = redirect_url.into();
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Aceita permissões separadas por espaço ou vírgula
pub fn parse_scope(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Garante a barra final, as rotas são concatenadas diretamente à base
pub fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL_VARS: &[&str] = &[
        "FACEBOOK_CLIENT_ID",
        "FACEBOOK_CLIENT_SECRET",
        "FACEBOOK_REDIRECT_URL",
        "FACEBOOK_SCOPE",
        "FACEBOOK_BASE_URL",
        "FACEBOOK_PREFIX",
        "FACEBOOK_ACCESS_TOKEN",
        "FACEBOOK_SESSION_ID",
        "FACEBOOK_USERNAME",
        "FACEBOOK_PASSWORD",
        "FACEBOOK_TIMEOUT_SECS",
    ];

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();

        assert_eq!(config.client_id, None);
        assert_eq!(config.client_secret, None);
        assert_eq!(config.redirect_url, "http://localhost:8080/oauth");
        assert_eq!(config.scope.len(), 5);
        assert_eq!(config.scope[0], "base");
        assert_eq!(config.scope[4], "foundation.web.subscribe");
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.prefix, "");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_without_env() {
        temp_env::with_vars_unset(ALL_VARS.to_vec(), || {
            let config = ApiConfig::load().unwrap();
            assert_eq!(config, ApiConfig::default());
        });
    }

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            vec![
                ("FACEBOOK_CLIENT_ID", Some("test_client_id")),
                ("FACEBOOK_CLIENT_SECRET", Some("test_client_secret")),
                ("FACEBOOK_SCOPE", Some("base, base.user   base.admin")),
                ("FACEBOOK_BASE_URL", Some("https://api.example.com/v1")),
                ("FACEBOOK_PREFIX", Some("adm/")),
                ("FACEBOOK_ACCESS_TOKEN", Some("")),
                ("FACEBOOK_USERNAME", None),
                ("FACEBOOK_PASSWORD", None),
                ("FACEBOOK_SESSION_ID", None),
            ],
            || {
                let config = ApiConfig::load().unwrap();

                assert_eq!(config.client_id.as_deref(), Some("test_client_id"));
                assert_eq!(config.client_secret.as_deref(), Some("test_client_secret"));
                assert_eq!(config.scope, vec!["base", "base.user", "base.admin"]);
                assert_eq!(config.base_url, "https://api.example.com/v1/");
                assert_eq!(config.prefix, "adm/");
                assert_eq!(config.access_token, None);
                assert_eq!(config.username, None);
            },
        );
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope("a b,c ,, d"), vec!["a", "b", "c", "d"]);
        assert!(parse_scope("  ").is_empty());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:1234"), "http://localhost:1234/");
        assert_eq!(normalize_base_url("http://localhost:1234/"), "http://localhost:1234/");
    }

    #[test]
    fn test_builders() {
        let config = ApiConfig::default()
            .with_base_url("http://127.0.0.1:9000")
            .with_client("id", "secret")
            .with_credentials("joe", "pass")
            .with_scope(["base"])
            .with_timeout_secs(5);

        assert_eq!(config.base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.client_id.as_deref(), Some("id"));
        assert_eq!(config.password.as_deref(), Some("pass"));
        assert_eq!(config.scope, vec!["base"]);
        assert_eq!(config.timeout_secs, 5);
    }
}
