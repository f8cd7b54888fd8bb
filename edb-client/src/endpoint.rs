//! Endpoint resolution
//!
//! A node endpoint is given as a URL plus a `secure` flag. An explicit
//! `ws://` or `wss://` scheme wins; the flag only picks the scheme for a bare
//! `host:port/path`.

use edb_core::{Error, Result};
use std::fmt;
use url::{Host, Url};

/// A resolved WebSocket endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    host: String,
    secure: bool,
}

impl Endpoint {
    /// Resolve `url` into a WebSocket endpoint
    ///
    /// ```rust
    /// use edb_client::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("localhost:1337/socketrpc", true).unwrap();
    /// assert_eq!(endpoint.url(), "wss://localhost:1337/socketrpc");
    ///
    /// let endpoint = Endpoint::parse("ws://localhost:1337/socketrpc", true).unwrap();
    /// assert!(!endpoint.is_secure());
    /// ```
    pub fn parse(url: &str, secure: bool) -> Result<Self> {
        let url = url.trim();

        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ((if secure { "wss" } else { "ws" }).to_string(), url),
        };
        // Special schemes skip extra slashes, so `ws:///path` would make `path` the host
        if rest.is_empty() || rest.starts_with('/') {
            return Err(Error::InvalidEndpoint(format!("missing host in {}", url)));
        }

        let parsed = Url::parse(&format!("{}://{}", scheme, rest))
            .map_err(|e| Error::InvalidEndpoint(format!("invalid endpoint `{}`: {}", url, e)))?;

        let secure = match parsed.scheme() {
            "ws" => false,
            "wss" => true,
            other => {
                return Err(Error::InvalidEndpoint(format!(
                    "unsupported scheme `{}` in {}; expected ws or wss",
                    other, url
                )))
            }
        };

        let host = match parsed.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(host) => host.to_string(),
            None => String::new(),
        };
        if host.is_empty() {
            return Err(Error::InvalidEndpoint(format!("missing host in {}", url)));
        }

        Ok(Self {
            url: parsed,
            host,
            secure,
        })
    }

    /// Full URL passed to the WebSocket handshake
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// True when the connection uses TLS
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
