// ABOUTME: Fetches pages for evaluation and decodes HTML bytes to text.
// ABOUTME: Blocks private network targets by default, caps body size, and honors or detects charsets.

//! Page fetching.
//!
//! The engine never performs I/O; this module is the collaborator that turns
//! a URL (or raw file bytes) into the HTML string the engine parses.

use std::collections::HashMap;
use std::net::IpAddr;

use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Maximum accepted body size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const PRIVATE_V4: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16",
];

const PRIVATE_V6: &[&str] = &["fc00::/7", "fe80::/10"];

/// Options for [`fetch`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
    /// Accept responses other than 200 OK.
    pub accept_non_200: bool,
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedPage {
    /// Body decoded to a string using the response charset or detection.
    pub fn text(&self) -> String {
        decode_html(&self.body, self.content_type.as_deref())
    }
}

fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4
            .iter()
            .filter_map(|net| net.parse::<Ipv4Net>().ok())
            .any(|net| net.contains(ip)),
        IpAddr::V6(ip) => {
            ip.is_loopback()
                || PRIVATE_V6
                    .iter()
                    .filter_map(|net| net.parse::<Ipv6Net>().ok())
                    .any(|net| net.contains(ip))
        }
    }
}

/// Decodes HTML bytes, preferring the charset named in `content_type`.
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(charset_of)
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let (decoded, _, _) = detector.guess(None, true).decode(body);
    decoded.into_owned()
}

fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim().to_lowercase();
        part.strip_prefix("charset=")
            .map(|cs| cs.trim_matches(|c| c == '"' || c == '\'').to_string())
    })
}

/// Rejects URLs whose host is, or resolves to, a private address.
async fn ensure_public(url: &Url, original: &str) -> Result<(), FetchError> {
    let Some(host) = url.host_str() else {
        return Ok(());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let blocked = if let Ok(ip) = host.parse::<IpAddr>() {
        is_private_ip(&ip)
    } else {
        let port = url.port_or_known_default().unwrap_or(80);
        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| FetchError::Dns {
                url: original.to_string(),
                source,
            })?;
        addrs.any(|addr| is_private_ip(&addr.ip()))
    };
    if blocked {
        Err(FetchError::PrivateNetwork {
            url: original.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Fetches `url` with `client`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchedPage, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    if !opts.allow_private_networks {
        ensure_public(&parsed, url).await?;
    }

    let mut request = client.get(parsed.clone());
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }
    debug!(url = %url, "fetching page");
    let response = request.send().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    if !opts.allow_private_networks && response.url() != &parsed {
        ensure_public(response.url(), url).await?;
    }

    if response
        .content_length()
        .is_some_and(|len| len as usize > MAX_CONTENT_LENGTH)
    {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
        });
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response.bytes().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    if body.len() > MAX_CONTENT_LENGTH {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
        });
    }
    if status != 200 && !opts.accept_non_200 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    debug!(url = %url, status, bytes = body.len(), "page fetched");
    Ok(FetchedPage {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn local() -> FetchOptions {
        FetchOptions {
            allow_private_networks: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fetch_ok_decodes_utf8() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/product");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body("<html><body><h1>Café</h1></body></html>");
            })
            .await;

        let page = fetch(&reqwest::Client::new(), &server.url("/product"), &local())
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert!(page.text().contains("Café"));
    }

    #[tokio::test]
    async fn non_200_rejected_unless_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404).body("<p>gone</p>");
            })
            .await;
        let client = reqwest::Client::new();
        let url = server.url("/gone");

        let err = fetch(&client, &url, &local()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));

        let opts = FetchOptions {
            accept_non_200: true,
            ..local()
        };
        assert_eq!(fetch(&client, &url, &opts).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn private_address_blocked_by_default() {
        let err = fetch(&reqwest::Client::new(), "http://127.0.0.1:9/", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::PrivateNetwork { .. }));
    }

    #[tokio::test]
    async fn bad_scheme_rejected() {
        let err = fetch(&reqwest::Client::new(), "ftp://example.com/", &local())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn private_ranges() {
        assert!(is_private_ip(&"10.1.2.3".parse().unwrap()));
        assert!(is_private_ip(&"172.20.0.1".parse().unwrap()));
        assert!(is_private_ip(&"::1".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));
        assert!(!is_private_ip(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_ip(&"2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn charset_header_is_honored() {
        let latin1 = b"<p>caf\xe9</p>";
        assert_eq!(decode_html(latin1, Some("text/html; charset=\"ISO-8859-1\"")), "<p>café</p>");
        assert_eq!(charset_of("text/html"), None);
    }

    #[test]
    fn utf8_detected_without_header() {
        assert_eq!(decode_html("<p>Grüße</p>".as_bytes(), None), "<p>Grüße</p>");
    }
}
