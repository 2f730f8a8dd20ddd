use gatehouse_security::Exchange;
use http::HeaderValue;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN,
};

const DEFAULT_ALLOW_HEADERS: &str = "Accept, Accept-Encoding, Authorization, Content-Length, \
     Content-Type, Host, Origin, X-Requested-With, User-Agent, No-Auth-Challenge";

/// Inject the CORS allow headers onto a response that is about to be
/// terminated with 401 or 403, so browser clients can read the outcome
/// cross-origin. The allowed origin echoes the request `Origin` when
/// present, `*` otherwise; allowed headers echo the preflight request
/// headers when present.
pub fn inject_access_control_allow_headers(exchange: &mut Exchange) {
    let origin = exchange
        .header(ORIGIN.as_str())
        .and_then(|o| HeaderValue::try_from(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let allow_headers = exchange
        .header(ACCESS_CONTROL_REQUEST_HEADERS.as_str())
        .and_then(|h| HeaderValue::try_from(h).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS));

    let headers = exchange.response_headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn echoes_request_origin() {
        let mut ex = Exchange::builder(Method::GET, "/coll")
            .header(ORIGIN, HeaderValue::from_static("https://app.example.com"))
            .build();

        inject_access_control_allow_headers(&mut ex);

        assert_eq!(
            ex.response_headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://app.example.com")
        );
        assert_eq!(
            ex.response_headers()
                .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
    }

    #[test]
    fn falls_back_to_wildcard_origin() {
        let mut ex = Exchange::builder(Method::GET, "/coll").build();

        inject_access_control_allow_headers(&mut ex);

        assert_eq!(
            ex.response_headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert!(ex.response_headers().contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
    }
}
