//! Shared application context

use std::path::PathBuf;
use std::sync::Arc;

use crate::infrastructure::auth::SignedTokenCodec;
use crate::infrastructure::proxy::{BackendUrlResolver, ProxyForwarder, ProxyRouter};
use crate::infrastructure::settings::SettingsStore;
use crate::infrastructure::team::TeamLifecycleManager;

/// Attributes of the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: "balancer".to_string(),
            secure: false,
        }
    }
}

impl SessionCookieConfig {
    /// `Set-Cookie` value carrying a session token
    pub fn issue(&self, token: &str) -> String {
        format!("{}={}; {}", self.name, token, self.attributes())
    }

    /// `Set-Cookie` value removing the session
    pub fn clear(&self) -> String {
        format!("{}=; Max-Age=0; {}", self.name, self.attributes())
    }

    fn attributes(&self) -> String {
        let mut attributes = "Path=/; HttpOnly; SameSite=Strict".to_string();

        if self.secure {
            attributes.push_str("; Secure");
        }

        attributes
    }
}

/// Everything a request handler needs; immutable once built
#[derive(Debug, Clone)]
pub struct AppState {
    pub teams: Arc<TeamLifecycleManager>,
    pub proxy_router: Arc<ProxyRouter>,
    pub forwarder: Arc<ProxyForwarder>,
    pub backend_urls: Arc<dyn BackendUrlResolver>,
    pub settings: Arc<SettingsStore>,
    pub tokens: Arc<SignedTokenCodec>,
    pub cookie: SessionCookieConfig,
    pub ui_dir: PathBuf,
}
