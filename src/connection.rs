//! Read-only transport connection view and connection options.
//!
//! The transport itself lives outside this crate. Callers hand a
//! [`ConnectionState`] snapshot to the template engine, which binds it under
//! the name `socket`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BindConfig;
use crate::value::{Record, Value};

/// Transport socket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connecting,
    Open,
    Closed,
}

impl SocketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketState::Connecting => "connecting",
            SocketState::Open => "open",
            SocketState::Closed => "closed",
        }
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Authenticated => "authenticated",
            AuthState::Unauthenticated => "unauthenticated",
        }
    }
}

/// Snapshot of the transport's connection state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub state: SocketState,
    pub pending_reconnect: bool,
    pub connect_attempts: u32,
    pub auth_state: AuthState,
    /// Decoded auth token claims, when authenticated.
    pub auth_token: Option<Record>,
}

impl ConnectionState {
    /// A fresh, unauthenticated connection in the given state.
    pub fn new(state: SocketState) -> Self {
        Self {
            state,
            pending_reconnect: false,
            connect_attempts: 0,
            auth_state: AuthState::Unauthenticated,
            auth_token: None,
        }
    }

    /// Mark as authenticated with the given token claims (builder).
    pub fn with_auth_token(mut self, token: Record) -> Self {
        self.auth_state = AuthState::Authenticated;
        self.auth_token = Some(token);
        self
    }

    /// Set the reconnect bookkeeping (builder).
    pub fn with_reconnect(mut self, pending: bool, attempts: u32) -> Self {
        self.pending_reconnect = pending;
        self.connect_attempts = attempts;
        self
    }

    /// The template-facing view: `state`, `pendingReconnect`,
    /// `connectAttempts`, `authState`, `authToken`.
    pub fn to_value(&self) -> Value {
        let mut view = Record::new();
        view.insert("state".into(), Value::from(self.state.as_str()));
        view.insert("pendingReconnect".into(), Value::Bool(self.pending_reconnect));
        view.insert("connectAttempts".into(), Value::from(self.connect_attempts));
        view.insert("authState".into(), Value::from(self.auth_state.as_str()));
        view.insert("authToken".into(), Value::from(self.auth_token.clone()));
        Value::Map(view)
    }
}

static URL_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:]+)://([^:/]*)(:[0-9]*)?(/.*)").expect("URL pattern is valid")
});

/// Options for creating a transport connection from a URL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionOptions {
    pub protocol_scheme: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub auth_token_name: String,
}

impl ConnectionOptions {
    /// Split `scheme://host[:port]/path` into options.
    ///
    /// A URL that does not have this shape yields options carrying only the
    /// configured auth token name, leaving the transport to its defaults.
    pub fn from_url(url: &str, config: &BindConfig) -> Self {
        let mut options = Self {
            auth_token_name: config.auth_token_name.clone(),
            ..Self::default()
        };
        let Some(caps) = URL_PARTS.captures(url) else {
            return options;
        };
        options.protocol_scheme = caps.get(1).map(|m| m.as_str().to_owned());
        options.hostname = caps.get(2).map(|m| m.as_str().to_owned());
        options.port = caps
            .get(3)
            .and_then(|m| m.as_str().trim_start_matches(':').parse().ok());
        options.path = caps.get(4).map(|m| m.as_str().to_owned());
        options
    }
}
