use serde_json::Value;
use crate::error::ApiResult;
use crate::transport::Params;
use super::{Api, AuthOptions};

pub const SELF_USER_PATH: &str = "me";

impl Api {
    /// Dados do usuário da sessão atual
    pub async fn self_user(&mut self) -> ApiResult<Value> {
        let url = self.url(SELF_USER_PATH);
        self.get(&url, Params::new(), AuthOptions::default()).await
    }

    /// Verificação de vida da sessão
    pub async fn ping(&mut self) -> ApiResult<Value> {
        self.self_user().await
    }
}
