use thiserror::Error;

/// Mensagem usada quando o transporte falha durante qualquer requisição
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Problems using access token found must re-authorize";

/// Mensagem usada quando o access token é requisitado mas não existe
pub const MISSING_TOKEN_MESSAGE: &str = "No access token found must re-authorize";

/// Mensagem usada quando não há modo de autenticação para renovar a sessão
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired or authentication issues";

/// Falhas produzidas pela camada de transporte HTTP
#[derive(Error, Debug)]
pub enum TransportError {
    /// Resposta com status HTTP de erro
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Falha de conexão, timeout ou leitura da resposta
    ///
    /// Guardada sem a URL, que carrega credenciais na query string.
    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}

impl TransportError {
    /// Status HTTP da falha, quando houver
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Erros do cliente da API
///
/// `Access` e `OAuthAccess` indicam que o chamador precisa autenticar
/// novamente antes de repetir a chamada. `OAuthAccess` é a especialização
/// para problemas com o access token.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Access(String),

    #[error("{0}")]
    OAuthAccess(String),

    /// Falha bruta do transporte. Nunca sai de `Api::request`, que a traduz
    /// para `OAuthAccess`.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn access(msg: impl Into<String>) -> Self {
        Self::Access(msg.into())
    }

    pub fn oauth_access(msg: impl Into<String>) -> Self {
        Self::OAuthAccess(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Verdadeiro quando o chamador deve refazer um fluxo de autenticação
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Access(_) | Self::OAuthAccess(_))
    }

    /// Verdadeiro para a especialização OAuth
    pub fn is_oauth(&self) -> bool {
        matches!(self, Self::OAuthAccess(_))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Tipo de resultado padrão do crate
pub type ApiResult<T> = Result<T, ApiError>;
