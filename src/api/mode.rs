use std::fmt;

/// Modo de autenticação derivado das credenciais configuradas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Usuário e senha configurados (login direto)
    Direct,
    /// Client id e client secret configurados (OAuth2)
    OAuth,
    /// Nenhum par de credenciais completo
    Unset,
}

impl AuthMode {
    /// Login direto tem precedência sobre OAuth quando os dois pares existem
    pub fn derive(
        username: Option<&str>,
        password: Option<&str>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Self {
        let present = |v: Option<&str>| v.map_or(false, |s| !s.is_empty());

        if present(username) && present(password) {
            Self::Direct
        } else if present(client_id) && present(client_secret) {
            Self::OAuth
        } else {
            Self::Unset
        }
    }

    /// Só os modos com credenciais podem renovar a sessão
    pub fn can_refresh(&self) -> bool {
        matches!(self, Self::Direct | Self::OAuth)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::OAuth => "oauth",
            Self::Unset => "unset",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_direct() {
        let mode = AuthMode::derive(Some("joe"), Some("secret"), None, None);
        assert_eq!(mode, AuthMode::Direct);
        assert!(mode.can_refresh());
    }

    #[test]
    fn test_direct_wins_over_oauth() {
        let mode = AuthMode::derive(Some("joe"), Some("secret"), Some("id"), Some("s"));
        assert_eq!(mode, AuthMode::Direct);
    }

    #[test]
    fn test_derive_oauth() {
        let mode = AuthMode::derive(Some("joe"), None, Some("id"), Some("s"));
        assert_eq!(mode, AuthMode::OAuth);
        assert!(mode.can_refresh());
    }

    #[test]
    fn test_derive_unset() {
        assert_eq!(AuthMode::derive(None, None, None, None), AuthMode::Unset);
        assert_eq!(AuthMode::derive(Some(""), Some(""), Some("id"), None), AuthMode::Unset);
        assert!(!AuthMode::Unset.can_refresh());
    }

    #[test]
    fn test_display() {
        assert_eq!(AuthMode::Direct.to_string(), "direct");
        assert_eq!(AuthMode::OAuth.to_string(), "oauth");
        assert_eq!(AuthMode::Unset.to_string(), "unset");
    }
}
