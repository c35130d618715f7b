//! HTTP client construction for catalog requests.

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Proxy;

use crate::transport::target::url_host;
use crate::transport::TransportConfig;

/// Create a configured HTTP client.
///
/// Redirects are never followed here: the transport client handles the single
/// permitted hop itself so that POST bodies survive it. Without an explicit
/// proxy, proxy environment variables are ignored too.
///
/// # Returns
/// A `reqwest::blocking::Client` with timeout, user agent, cookie store and
/// the configured proxy.
pub fn create_client(config: &TransportConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::none())
        .cookie_store(true);

    builder = match &config.proxy {
        Some(proxy) => {
            let proxy_url = format!("http://{}:{}", url_host(&proxy.host), proxy.port);
            let mut proxy_setting = Proxy::all(proxy_url)?;
            if let Some(credentials) = &config.proxy_credentials {
                proxy_setting = proxy_setting.basic_auth(&credentials.username, &credentials.password);
            }
            tracing::debug!(host = %proxy.host, port = proxy.port, "routing requests through proxy");
            builder.proxy(proxy_setting)
        }
        None => builder.no_proxy(),
    };

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Credentials, ProxyConfig};

    #[test]
    fn test_create_client() {
        assert!(create_client(&TransportConfig::default()).is_ok());
    }

    #[test]
    fn test_create_client_with_proxy() {
        let config = TransportConfig {
            proxy: Some(ProxyConfig {
                host: "proxy.local".to_string(),
                port: 3128,
            }),
            proxy_credentials: Some(Credentials::new("p", "q")),
            ..TransportConfig::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_create_client_with_ipv6_proxy() {
        let config = TransportConfig {
            proxy: Some(ProxyConfig {
                host: "::1".to_string(),
                port: 3128,
            }),
            ..TransportConfig::default()
        };
        assert!(create_client(&config).is_ok());
    }
}
