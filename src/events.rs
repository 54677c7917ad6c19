//! Eventos emitidos pelo cliente após cada autenticação bem sucedida

use serde_json::Value;
use std::sync::Arc;

/// Evento emitido pelo cliente
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEvent {
    /// Sessão iniciada (login direto ou sessão OAuth), com a resposta completa
    Auth(Value),
    /// Access token obtido na troca do authorization code
    AccessToken(String),
}

impl ApiEvent {
    /// Nome estável do evento
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::AccessToken(_) => "access_token",
        }
    }
}

/// Observador de eventos do cliente
///
/// Chamado de forma síncrona, na ordem de registro.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &ApiEvent);
}

impl<F> EventListener for F
where
    F: Fn(&ApiEvent) + Send + Sync,
{
    fn on_event(&self, event: &ApiEvent) {
        self(event)
    }
}

/// Lista de observadores registrados
#[derive(Clone, Default)]
pub struct EventListeners {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn trigger(&self, event: ApiEvent) {
        tracing::debug!(event = event.name(), listeners = self.listeners.len(), "Triggering event");

        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_event_names() {
        assert_eq!(ApiEvent::Auth(json!({})).name(), "auth");
        assert_eq!(ApiEvent::AccessToken("t".to_string()).name(), "access_token");
    }

    #[test]
    fn test_listeners_called_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = EventListeners::new();

        let first = Arc::clone(&seen);
        listeners.add(Arc::new(move |e: &ApiEvent| {
            first.lock().unwrap().push(format!("first:{}", e.name()));
        }));
        let second = Arc::clone(&seen);
        listeners.add(Arc::new(move |e: &ApiEvent| {
            second.lock().unwrap().push(format!("second:{}", e.name()));
        }));

        listeners.trigger(ApiEvent::AccessToken("abc".to_string()));

        assert_eq!(listeners.len(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:access_token".to_string(), "second:access_token".to_string()]
        );
    }

    #[test]
    fn test_trigger_without_listeners() {
        let listeners = EventListeners::new();
        assert!(listeners.is_empty());
        listeners.trigger(ApiEvent::Auth(json!({"session_id": "s"})));
    }
}
