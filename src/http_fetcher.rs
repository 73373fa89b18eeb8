//! Outbound HTTP with a global concurrency cap, optional proxy, and an
//! opt-in DNS-cache rewrite for adversarial upstreams (spec section 4.2).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::dns_cache::DnsCache;
use crate::error::FetchError;

/// All outbound calls, from every [`HttpFetcher`] instance, pass through
/// this cap (spec section 4.2: "global semaphore of 50 concurrent
/// requests, regardless of session").
const GLOBAL_CONCURRENCY: usize = 50;

static GLOBAL_SEMAPHORE: std::sync::OnceLock<Arc<Semaphore>> = std::sync::OnceLock::new();

fn global_semaphore() -> Arc<Semaphore> {
    GLOBAL_SEMAPHORE
        .get_or_init(|| Arc::new(Semaphore::new(GLOBAL_CONCURRENCY)))
        .clone()
}

/// Per-call options. Defaults match the common path: raise on 4xx/5xx, no
/// explicit timeout override (falls back to the client's default).
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub ignore_status: bool,
    pub timeout: Option<Duration>,
}

pub struct HttpFetcher {
    client: Client,
    /// Same TLS/proxy settings as `client`, but never follows redirects —
    /// used only by `head_redirect` (spec section 4.2).
    no_redirect_client: Client,
    dns_cache: Arc<DnsCache>,
    dns_cache_rewrite: bool,
}

impl HttpFetcher {
    pub fn new(proxy: Option<&str>, dns_cache_rewrite: bool) -> anyhow::Result<Self> {
        let build = |follow_redirects: bool| -> anyhow::Result<Client> {
            let mut builder = Client::builder()
                // The upstream serves valid certs under mismatched
                // hostnames when requests are rewritten to a cached IP;
                // verification is disabled only when that rewriting is
                // enabled (spec section 9, "DNS-cache rewriting").
                .danger_accept_invalid_certs(dns_cache_rewrite)
                .timeout(Duration::from_secs(60));
            if !follow_redirects {
                builder = builder.redirect(reqwest::redirect::Policy::none());
            }
            if let Some(proxy_url) = proxy {
                builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
            }
            Ok(builder.build()?)
        };

        Ok(HttpFetcher {
            client: build(true)?,
            no_redirect_client: build(false)?,
            dns_cache: Arc::new(DnsCache::new()),
            dns_cache_rewrite,
        })
    }

    async fn permit(&self) -> OwnedSemaphorePermit {
        global_semaphore()
            .acquire_owned()
            .await
            .expect("global semaphore is never closed")
    }

    fn check_status(resp: &reqwest::Response, opts: &CallOptions) -> Result<(), FetchError> {
        if opts.ignore_status {
            return Ok(());
        }
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status(status));
        }
        Ok(())
    }

    /// Rewrite `url`'s host to a cached resolved IP and attach an explicit
    /// `Host` header, when DNS-cache rewriting is enabled and a cached
    /// entry exists. Cache misses use normal resolution (spec section
    /// 4.2).
    fn maybe_rewrite(&self, url: &str) -> (String, Option<String>) {
        if !self.dns_cache_rewrite {
            return (url.to_string(), None);
        }
        let Ok(parsed) = url::Url::parse(url) else {
            return (url.to_string(), None);
        };
        let Some(host) = parsed.host_str() else {
            return (url.to_string(), None);
        };
        let Some(ip) = self.dns_cache.get(host) else {
            return (url.to_string(), None);
        };
        let mut rewritten = parsed.clone();
        let _ = rewritten.set_host(Some(&ip.to_string()));
        (rewritten.to_string(), Some(host.to_string()))
    }

    fn record_resolved_ip(&self, url: &str, remote_addr: Option<std::net::SocketAddr>) {
        if !self.dns_cache_rewrite {
            return;
        }
        let (Some(addr), Ok(parsed)) = (remote_addr, url::Url::parse(url)) else {
            return;
        };
        if let Some(host) = parsed.host_str() {
            self.dns_cache.set(host.to_string(), addr.ip());
        }
    }

    pub async fn get(&self, url: &str, opts: CallOptions) -> Result<String, FetchError> {
        let _permit = self.permit().await;
        let (effective_url, host_header) = self.maybe_rewrite(url);

        let mut req = self.client.get(&effective_url);
        if let Some(host) = &host_header {
            req = req.header("Host", host.as_str());
        }
        if let Some(timeout) = opts.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        self.record_resolved_ip(url, resp.remote_addr());
        Self::check_status(&resp, &opts)?;
        Ok(resp.text().await?)
    }

    /// Like [`get`](Self::get), but returns the raw response body —
    /// used for binary downloads (grid source images) rather than text.
    pub async fn get_bytes(&self, url: &str, opts: CallOptions) -> Result<Vec<u8>, FetchError> {
        let _permit = self.permit().await;
        let (effective_url, host_header) = self.maybe_rewrite(url);

        let mut req = self.client.get(&effective_url);
        if let Some(host) = &host_header {
            req = req.header("Host", host.as_str());
        }
        if let Some(timeout) = opts.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        self.record_resolved_ip(url, resp.remote_addr());
        Self::check_status(&resp, &opts)?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub async fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
        opts: CallOptions,
    ) -> Result<String, FetchError> {
        let _permit = self.permit().await;
        let (effective_url, host_header) = self.maybe_rewrite(url);

        let mut req = self.client.post(&effective_url).form(form);
        if let Some(host) = &host_header {
            req = req.header("Host", host.as_str());
        }
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        if let Some(timeout) = opts.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        self.record_resolved_ip(url, resp.remote_addr());
        Self::check_status(&resp, &opts)?;
        Ok(resp.text().await?)
    }

    /// `HEAD` without following redirects. Returns the `Location` header
    /// value, or an empty string if absent (spec section 4.2).
    pub async fn head_redirect(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let _permit = self.permit().await;
        let (effective_url, host_header) = self.maybe_rewrite(url);

        let mut req = self.no_redirect_client.head(&effective_url).timeout(timeout);
        if let Some(host) = &host_header {
            req = req.header("Host", host.as_str());
        }

        let resp = req.send().await?;
        self.record_resolved_ip(url, resp.remote_addr());
        Ok(resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(None, false).unwrap();
        let body = fetcher
            .get(&format!("{}/ok", server.url()), CallOptions::default())
            .await
            .unwrap();
        assert_eq!(body, "hello");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn get_raises_on_5xx_unless_ignored() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/broken").with_status(500).create_async().await;

        let fetcher = HttpFetcher::new(None, false).unwrap();
        let url = format!("{}/broken", server.url());

        let err = fetcher.get(&url, CallOptions::default()).await;
        assert!(matches!(err, Err(FetchError::Status(_))));

        let ok = fetcher
            .get(
                &url,
                CallOptions {
                    ignore_status: true,
                    ..Default::default()
                },
            )
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn head_redirect_returns_location_without_following() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/go")
            .with_status(302)
            .with_header("Location", "https://example.com/dest")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(None, false).unwrap();
        let location = fetcher
            .head_redirect(&format!("{}/go", server.url()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(location, "https://example.com/dest");
    }
}
