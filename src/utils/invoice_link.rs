/// Host used when neither an explicit origin nor forwarded headers are
/// available (direct hits on the service without a proxy in front).
const FALLBACK_PUBLIC_HOST: &str = "billpost.shop";

/// Origin hints taken from the inbound request's proxy headers.
#[derive(Debug, Default, Clone)]
pub struct ForwardedOrigin {
    pub proto: Option<String>,
    pub host: Option<String>,
}

impl ForwardedOrigin {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        };
        Self {
            proto: header("x-forwarded-proto"),
            host: header("x-forwarded-host"),
        }
    }
}

/// Builds the public invoice link for a bill token.
///
/// An explicit origin (deployment config) wins over forwarded headers.
/// A missing or literal `"none"` token degrades to the bare origin: the
/// caller may legitimately have no invoice to link yet.
pub fn resolve(origin: Option<&str>, forwarded: &ForwardedOrigin, bill_token: Option<&str>) -> String {
    let origin = match origin {
        Some(origin) => origin.to_string(),
        None => {
            let proto = forwarded.proto.as_deref().unwrap_or("https");
            let host = forwarded.host.as_deref().unwrap_or(FALLBACK_PUBLIC_HOST);
            format!("{}://{}", proto, host)
        }
    };
    let origin = origin.trim_end_matches('/');

    match bill_token {
        Some(token) if token != "none" => format!("{}/public/invoice/{}", origin, token),
        _ => origin.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(proto: &str, host: &str) -> ForwardedOrigin {
        ForwardedOrigin {
            proto: Some(proto.to_string()),
            host: Some(host.to_string()),
        }
    }

    #[test]
    fn builds_link_from_forwarded_headers() {
        assert_eq!(
            resolve(None, &forwarded("https", "shop.example"), Some("abc123")),
            "https://shop.example/public/invoice/abc123"
        );
    }

    #[test]
    fn missing_token_yields_bare_origin() {
        assert_eq!(
            resolve(None, &forwarded("https", "shop.example"), None),
            "https://shop.example"
        );
    }

    #[test]
    fn literal_none_token_is_treated_as_absent() {
        assert_eq!(
            resolve(None, &forwarded("https", "shop.example"), Some("none")),
            "https://shop.example"
        );
    }

    #[test]
    fn explicit_origin_wins_over_headers() {
        assert_eq!(
            resolve(
                Some("https://billpost.example"),
                &forwarded("http", "ignored.example"),
                Some("t0k3n"),
            ),
            "https://billpost.example/public/invoice/t0k3n"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(
            resolve(Some("https://shop.example/"), &ForwardedOrigin::default(), Some("abc")),
            "https://shop.example/public/invoice/abc"
        );
    }

    #[test]
    fn defaults_apply_without_headers() {
        assert_eq!(
            resolve(None, &ForwardedOrigin::default(), None),
            format!("https://{}", FALLBACK_PUBLIC_HOST)
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        let fwd = forwarded("https", "shop.example");
        assert_eq!(
            resolve(None, &fwd, Some("abc123")),
            resolve(None, &fwd, Some("abc123"))
        );
    }
}
