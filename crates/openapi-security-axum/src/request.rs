//! Multi-value lookups over request headers, query parameters and cookies

use axum::http::{header, request::Parts, HeaderMap};
use indexmap::IndexMap;
use openapi_security::InType;

/// Read access to a multi-valued request collection
pub trait MultiDict {
    /// First value stored under `key`
    fn get(&self, key: &str) -> Option<&str>;

    /// Every value stored under `key`, in request order
    fn get_list(&self, key: &str) -> Vec<&str>;

    /// Distinct keys, in request order
    fn keys(&self) -> Vec<&str>;
}

/// Header names are case-insensitive; values that are not visible ASCII are skipped.
impl MultiDict for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        HeaderMap::get(self, key).and_then(|value| value.to_str().ok())
    }

    fn get_list(&self, key: &str) -> Vec<&str> {
        self.get_all(key)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    fn keys(&self) -> Vec<&str> {
        HeaderMap::keys(self).map(|name| name.as_str()).collect()
    }
}

/// Ordered multi-map used for query parameters and cookies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MultiMap(IndexMap<String, Vec<String>>);

impl MultiMap {
    fn append(&mut self, key: String, value: String) {
        self.0.entry(key).or_default().push(value);
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// Decoded query string parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(MultiMap);

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string
    pub fn parse(query: &str) -> Self {
        let mut params = MultiMap::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        Self(params)
    }
}

impl MultiDict for QueryParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.first(key)
    }

    fn get_list(&self, key: &str) -> Vec<&str> {
        self.0.all(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys()
    }
}

/// Cookies sent in every `Cookie` header of a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(MultiMap);

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = MultiMap::default();
        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            // `a=1; b="2"`, pairs without `=` are ignored
            for pair in value.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    let value = value.trim();
                    let value = value
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .unwrap_or(value);
                    cookies.append(name.to_string(), value.to_string());
                }
            }
        }
        Self(cookies)
    }
}

impl MultiDict for Cookies {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.first(key)
    }

    fn get_list(&self, key: &str) -> Vec<&str> {
        self.0.all(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys()
    }
}

/// Credential carriers of one request
#[derive(Debug, Clone)]
pub struct RequestCredentials<'a> {
    headers: &'a HeaderMap,
    query: QueryParams,
    cookies: Cookies,
}

impl<'a> RequestCredentials<'a> {
    pub fn new(headers: &'a HeaderMap, query: Option<&str>) -> Self {
        Self {
            headers,
            query: query.map(QueryParams::parse).unwrap_or_default(),
            cookies: Cookies::from_headers(headers),
        }
    }

    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::new(&parts.headers, parts.uri.query())
    }

    /// Non-empty value of an API key carried in `location`
    pub fn lookup(&self, location: InType, name: &str) -> Option<&str> {
        let value = match location {
            InType::Header => MultiDict::get(self.headers, name),
            InType::Query => self.query.get(name),
            InType::Cookie => self.cookies.get(name),
        };
        value.filter(|value| !value.trim().is_empty())
    }

    /// Raw `Authorization` header
    pub fn authorization(&self) -> Option<&str> {
        MultiDict::get(self.headers, header::AUTHORIZATION.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.headers
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("partner-id", HeaderValue::from_static("42"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));

        assert_eq!(MultiDict::get(&headers, "Partner-ID"), Some("42"));
        assert_eq!(headers.get_list("x-tag"), vec!["a", "b"]);
        assert_eq!(MultiDict::keys(&headers), vec!["partner-id", "x-tag"]);
        assert_eq!(MultiDict::get(&headers, "missing"), None);
    }

    #[test]
    fn test_query_params() {
        let query = QueryParams::parse("api_key=abc%20def&tag=a&tag=b&empty=");

        assert_eq!(query.get("api_key"), Some("abc def"));
        assert_eq!(query.get_list("tag"), vec!["a", "b"]);
        assert_eq!(query.get("empty"), Some(""));
        assert_eq!(query.keys(), vec!["api_key", "tag", "empty"]);
        assert!(query.get_list("missing").is_empty());
    }

    #[test]
    fn test_cookies_from_every_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("sid=\"abc\"; theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("sid=def; =skipped; flag"));

        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.get("sid"), Some("abc"));
        assert_eq!(cookies.get_list("sid"), vec!["abc", "def"]);
        assert_eq!(cookies.keys(), vec!["sid", "theme"]);
    }

    #[test]
    fn test_credentials_from_parts() {
        let (parts, _) = Request::builder()
            .uri("/ping?token=t1")
            .header("partner-id", "42")
            .header("authorization", "Bearer abc")
            .header("cookie", "session=  ")
            .body(())
            .unwrap()
            .into_parts();

        let credentials = RequestCredentials::from_parts(&parts);
        assert_eq!(credentials.lookup(InType::Header, "partner-id"), Some("42"));
        assert_eq!(credentials.lookup(InType::Query, "token"), Some("t1"));
        assert_eq!(credentials.lookup(InType::Cookie, "session"), None);
        assert_eq!(credentials.authorization(), Some("Bearer abc"));
    }
}
