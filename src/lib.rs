//! # Facebook API Rust Crate
//!
//! Cliente fino para a API HTTP da rede social, com autenticação por sessão
//! (login direto) e pelo fluxo OAuth2 authorization code.
//!
//! ## Features
//!
//! - Injeção automática de `session_id` e `access_token` nas chamadas
//! - Renovação da sessão quando o servidor responde com desafio de autenticação
//! - Erros tipados indicando quando é preciso autenticar novamente
//! - Transporte HTTP injetável (padrão: `reqwest`)
//! - Eventos `auth` e `access_token` via observadores
//!
//! ## Exemplo
//!
//! ```no_run
//! use facebook_api::{Api, ApiConfig, AuthOptions};
//! use facebook_api::transport::Params;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::load()?;
//!     let mut api = Api::new(config)?;
//!
//!     println!("Autorize em: {}", api.oauth_authorize()?);
//!     api.oauth_access("code-recebido-no-redirect").await?;
//!
//!     let url = api.url("me");
//!     let me = api.get(&url, Params::new(), AuthOptions::default()).await?;
//!     println!("{}", me);
//!     Ok(())
//! }
//! ```

/// Cliente da API e fluxos de autenticação
pub mod api;

/// Configuração do cliente
pub mod config;

/// Tipos de erro
pub mod error;

/// Eventos emitidos pelo cliente
pub mod events;

/// Transporte HTTP injetável
pub mod transport;

// Re-exportações para conveniência
pub use api::{Api, AuthMode, AuthOptions, AuthSession};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, TransportError};
pub use events::{ApiEvent, EventListener};
pub use transport::{Body, ReqwestTransport, Transport};
