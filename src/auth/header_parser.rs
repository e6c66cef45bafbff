//! # 认证头解析器
//!
//! 从 `Authorization` 头中提取 Basic 凭据或 Bearer 令牌。格式错误或缺失的头
//! 视为“该策略不适用”，而不是错误。

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::{Engine as _, engine::general_purpose};

use crate::auth::types::BasicCredential;

const BASIC_SCHEME: &str = "Basic";
const BEARER_SCHEME: &str = "Bearer";

/// 通用认证头解析器
pub struct AuthHeaderParser;

impl AuthHeaderParser {
    /// First well-formed basic credential among the request's
    /// `Authorization` headers.
    #[must_use]
    pub fn basic_from_headers(headers: &HeaderMap) -> Option<BasicCredential> {
        Self::authorization_values(headers).find_map(Self::parse_basic)
    }

    /// First non-empty bearer token among the request's `Authorization`
    /// headers.
    #[must_use]
    pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
        Self::authorization_values(headers).find_map(Self::parse_bearer)
    }

    /// 解析 `Basic <base64(username:password)>`
    #[must_use]
    pub fn parse_basic(header_value: &str) -> Option<BasicCredential> {
        let encoded = Self::strip_scheme(header_value, BASIC_SCHEME)?;
        let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
        let credentials = String::from_utf8(decoded).ok()?;
        let (username, password) = credentials.split_once(':')?;
        Some(BasicCredential::new(username, password))
    }

    /// 解析 `Bearer <token>`
    #[must_use]
    pub fn parse_bearer(header_value: &str) -> Option<String> {
        Self::strip_scheme(header_value, BEARER_SCHEME).map(str::to_string)
    }

    fn authorization_values(headers: &HeaderMap) -> impl Iterator<Item = &str> {
        headers
            .get_all(AUTHORIZATION)
            .iter()
            .filter_map(|value| value.to_str().ok())
    }

    // Scheme names are case-insensitive; the parameter must be non-empty.
    fn strip_scheme<'a>(header_value: &'a str, scheme: &str) -> Option<&'a str> {
        let (name, rest) = header_value.trim().split_once(' ')?;
        if !name.eq_ignore_ascii_case(scheme) {
            return None;
        }
        let rest = rest.trim();
        (!rest.is_empty()).then_some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(user_pass))
    }

    #[rstest]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("bearer abc", Some("abc"))]
    #[case("BEARER   abc  ", Some("abc"))]
    #[case("Bearer ", None)]
    #[case("Bearer", None)]
    #[case("Token abc", None)]
    #[case("abc", None)]
    fn test_parse_bearer(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            AuthHeaderParser::parse_bearer(header).as_deref(),
            expected
        );
    }

    #[test]
    fn test_parse_basic() {
        let credential = AuthHeaderParser::parse_basic(&basic("admin:admin")).unwrap();
        assert_eq!(credential.username, "admin");
        assert_eq!(credential.password, "admin");
    }

    #[test]
    fn test_parse_basic_password_may_contain_colon() {
        let credential = AuthHeaderParser::parse_basic(&basic("admin:a:b")).unwrap();
        assert_eq!(credential.username, "admin");
        assert_eq!(credential.password, "a:b");
    }

    #[rstest]
    #[case("Basic !!!not-base64")]
    #[case("Basic ")]
    #[case("Bearer YWRtaW46YWRtaW4=")]
    fn test_parse_basic_malformed(#[case] header: &str) {
        assert!(AuthHeaderParser::parse_basic(header).is_none());
    }

    #[test]
    fn test_parse_basic_without_separator() {
        assert!(AuthHeaderParser::parse_basic(&basic("adminadmin")).is_none());
    }

    #[test]
    fn test_headers_with_both_schemes() {
        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, HeaderValue::from_str(&basic("admin:admin")).unwrap());
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));

        assert_eq!(
            AuthHeaderParser::bearer_from_headers(&headers).as_deref(),
            Some("tok")
        );
        assert_eq!(
            AuthHeaderParser::basic_from_headers(&headers).map(|c| c.username),
            Some("admin".to_string())
        );
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(AuthHeaderParser::bearer_from_headers(&headers).is_none());
        assert!(AuthHeaderParser::basic_from_headers(&headers).is_none());
    }
}
