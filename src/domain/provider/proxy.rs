//! Network proxy descriptor

use serde::{Deserialize, Serialize};

/// Proxy protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProxyKind {
    #[default]
    #[serde(rename = "HTTP", alias = "http")]
    Http,
    #[serde(rename = "SOCKS5", alias = "socks5")]
    Socks5,
}

impl ProxyKind {
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Socks5 => "socks5",
        }
    }
}

/// Proxy configuration applied to all provider traffic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "type", default)]
    pub kind: ProxyKind,
    /// `user:pass@host:port` or `host:port`, scheme prefix optional
    #[serde(default)]
    pub connection_string: String,
}

impl ProxyConfig {
    /// Full proxy URL, or None when disabled or blank.
    ///
    /// Any scheme prefix in the connection string is replaced by the one
    /// matching `kind`.
    pub fn url(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let address = strip_scheme(self.connection_string.trim());
        if address.is_empty() {
            return None;
        }
        Some(format!("{}://{}", self.kind.scheme(), address))
    }

    /// Host part only, safe to log
    pub fn redacted(&self) -> String {
        let address = strip_scheme(self.connection_string.trim());
        address
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or(address)
            .to_string()
    }
}

fn strip_scheme(s: &str) -> &str {
    ["http://", "https://", "socks5://", "socks5h://"]
        .iter()
        .find_map(|prefix| s.strip_prefix(prefix))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(kind: ProxyKind, conn: &str) -> ProxyConfig {
        ProxyConfig {
            enabled: true,
            kind,
            connection_string: conn.to_string(),
        }
    }

    #[test]
    fn disabled_proxy_has_no_url() {
        let mut p = proxy(ProxyKind::Http, "127.0.0.1:8080");
        p.enabled = false;
        assert_eq!(p.url(), None);
    }

    #[test]
    fn blank_connection_has_no_url() {
        assert_eq!(proxy(ProxyKind::Http, "  ").url(), None);
    }

    #[test]
    fn scheme_is_rebuilt_from_kind() {
        let p = proxy(ProxyKind::Socks5, "http://user:pw@10.0.0.1:1080");
        assert_eq!(p.url().unwrap(), "socks5://user:pw@10.0.0.1:1080");

        let p = proxy(ProxyKind::Http, "socks5://10.0.0.1:3128");
        assert_eq!(p.url().unwrap(), "http://10.0.0.1:3128");
    }

    #[test]
    fn redacted_drops_credentials() {
        let p = proxy(ProxyKind::Http, "user:secret@proxy.local:3128");
        assert_eq!(p.redacted(), "proxy.local:3128");
    }

    #[test]
    fn deserializes_type_field() {
        let p: ProxyConfig = toml::from_str(
            r#"
enabled = true
type = "SOCKS5"
connection_string = "host:1"
"#,
        )
        .unwrap();
        assert_eq!(p.kind, ProxyKind::Socks5);
    }
}
