//! The exposed HTTP surface, framework-free.
//!
//! Handlers take and return `http` types so they can sit behind any server
//! (or none, in tests). Rate limiting is applied before any upstream call;
//! upstream error bodies are never echoed to the end user.

use std::collections::HashSet;

use http::{HeaderMap, Request, Response, StatusCode};
use url::Url;

use crate::ratelimit::{RateLimiter, client_key, rate_limit_response};
use crate::{VhClient, VhError, profile, sets};

const CSP: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://static.cloudflareinsights.com; \
    style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    img-src 'self' data: https://mc-heads.net https://wiki.vaulthunters.gg; \
    base-uri 'self'; frame-ancestors 'none'";

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

/// Aggregation gateway: profile lookup, reward-set catalog, image proxy.
pub struct Gateway {
    client: VhClient,
    limiter: RateLimiter,
    allowed_image_hosts: HashSet<String>,
    require_https_images: bool,
}

impl Gateway {
    pub fn new(client: VhClient, limiter: RateLimiter) -> Self {
        Self {
            client,
            limiter,
            allowed_image_hosts: ["wiki.vaulthunters.gg", "mc-heads.net"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            require_https_images: true,
        }
    }

    /// Add a host to the image-proxy allow-list.
    #[must_use]
    pub fn allow_image_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_image_hosts.insert(host.into());
        self
    }

    /// Relax the `https`-only rule for proxied images (test seam).
    #[must_use]
    pub fn require_https_images(mut self, yes: bool) -> Self {
        self.require_https_images = yes;
        self
    }

    /// `GET /api/profile?username=<name>`
    pub async fn handle_profile(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        if let Some(rejected) = self.check_rate_limit(req.headers()) {
            return rejected;
        }

        let username = match query_param(req, "username") {
            Some(u) if !u.trim().is_empty() => u.trim().to_string(),
            _ => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "Username query parameter is required.",
                );
            }
        };

        match profile::lookup(&self.client, &username).await {
            Ok(p) => json_response(StatusCode::OK, &p),
            Err(VhError::InvalidUsername(_)) => {
                json_error(StatusCode::BAD_REQUEST, "Invalid Minecraft username.")
            }
            Err(VhError::Status { status: 404, .. }) => {
                json_error(StatusCode::NOT_FOUND, "Player not found.")
            }
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "profile lookup failed");
                upstream_failure(&e, "Failed to retrieve player data. Please try again.")
            }
        }
    }

    /// `GET /api/sets`
    pub async fn handle_sets(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        if let Some(rejected) = self.check_rate_limit(req.headers()) {
            return rejected;
        }

        match sets::fetch_all(&self.client).await {
            Ok(list) => json_response(StatusCode::OK, &list),
            Err(e) => {
                tracing::warn!(error = %e, "reward-set catalog fetch failed");
                upstream_failure(&e, "Failed to retrieve reward sets. Please try again.")
            }
        }
    }

    /// `GET /img?url=<https target>`: allow-listed image passthrough.
    pub async fn handle_image(&self, req: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        let raw = match query_param(req, "url") {
            Some(raw) if !raw.is_empty() => raw,
            _ => return text_response(StatusCode::BAD_REQUEST, "Missing url parameter"),
        };

        let target = match Url::parse(&raw) {
            Ok(t) => t,
            Err(_) => return text_response(StatusCode::BAD_REQUEST, "Invalid URL"),
        };

        let host_allowed = target
            .host_str()
            .is_some_and(|h| self.allowed_image_hosts.contains(h));
        let scheme_allowed = target.scheme() == "https" || !self.require_https_images;
        if !scheme_allowed || !host_allowed {
            return text_response(StatusCode::BAD_REQUEST, "URL not allowed");
        }

        let mut upstream_req = self
            .client
            .http()
            .get(target.clone())
            .header("accept", IMAGE_ACCEPT)
            .header("referer", format!("{}/", target.origin().ascii_serialization()));
        for name in [http::header::IF_NONE_MATCH, http::header::IF_MODIFIED_SINCE] {
            if let Some(v) = req.headers().get(&name) {
                upstream_req = upstream_req.header(name, v);
            }
        }

        let upstream = match self
            .client
            .send_with_timeout(upstream_req, std::time::Duration::from_secs(10))
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "image proxy fetch failed");
                return text_response(StatusCode::BAD_GATEWAY, "Proxy error");
            }
        };

        if upstream.status() == reqwest::StatusCode::NOT_MODIFIED {
            let mut builder = Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(
                    http::header::CACHE_CONTROL,
                    "public, max-age=31536000, immutable",
                )
                .header(http::header::VARY, "Accept");
            for name in ["etag", "last-modified"] {
                if let Some(v) = upstream.headers().get(name) {
                    builder = builder.header(name, v);
                }
            }
            return builder.body(Vec::new()).expect("static 304 response");
        }

        if !upstream.status().is_success() {
            let status = StatusCode::from_u16(upstream.status().as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            return text_response(status, "Upstream error");
        }

        let content_type = upstream
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_ascii_lowercase().starts_with("image/") {
            return text_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type");
        }

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, content_type)
            .header(
                http::header::CACHE_CONTROL,
                "public, max-age=31536000, immutable",
            )
            .header(http::header::VARY, "Accept");
        for name in ["etag", "last-modified"] {
            if let Some(v) = upstream.headers().get(name) {
                builder = builder.header(name, v);
            }
        }

        match upstream.bytes().await {
            Ok(bytes) => builder
                .body(bytes.to_vec())
                .expect("image proxy response"),
            Err(_) => text_response(StatusCode::BAD_GATEWAY, "Proxy error"),
        }
    }

    fn check_rate_limit(&self, headers: &HeaderMap) -> Option<Response<Vec<u8>>> {
        let key = client_key(headers);
        if self.limiter.allow(&key) {
            None
        } else {
            Some(rate_limit_response(&self.limiter.info(&key)))
        }
    }
}

/* ---------------- response helpers ---------------- */

fn query_param(req: &Request<Vec<u8>>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response<Vec<u8>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    with_security_headers(
        Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8"),
    )
    .body(bytes)
    .expect("json response")
}

fn json_error(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Map an internal failure to the generic 502 payload. Structured detail goes
/// into `details` for diagnostics; the upstream body never passes through.
fn upstream_failure(e: &VhError, message: &str) -> Response<Vec<u8>> {
    json_response(
        StatusCode::BAD_GATEWAY,
        &serde_json::json!({
            "error": message,
            "details": {
                "timeout": e.is_timeout(),
                "status": e.upstream_status(),
            },
        }),
    )
}

fn text_response(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    with_security_headers(
        Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8"),
    )
    .body(message.as_bytes().to_vec())
    .expect("text response")
}

fn with_security_headers(builder: http::response::Builder) -> http::response::Builder {
    builder
        .header(http::header::CONTENT_SECURITY_POLICY, CSP)
        .header(http::header::X_FRAME_OPTIONS, "DENY")
}
