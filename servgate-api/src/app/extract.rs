use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Query parameter carrying the shared secret.
pub const TOKEN_PARAM: &str = "TOKEN";

/// Token from the `TOKEN` query parameter, if any.
///
/// Never rejects: a missing token is handed to the gateway as `None` so the
/// request is answered with 401 before anything else is looked at.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AccessToken {
    type Rejection = Infallible;

    fn from_request_parts<'a, 'b, 'c>(
        parts: &'a mut Parts,
        _state: &'b S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'c>>
    where
        'a: 'c,
        'b: 'c,
    {
        let token = parts.uri.query().and_then(token_from_query);
        Box::pin(async move { Ok(AccessToken(token)) })
    }
}

/// First `TOKEN` pair in a raw query string, form-decoded (`+` is a space).
fn token_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_token_among_other_params() {
        assert_eq!(
            token_from_query("a=1&TOKEN=s%40cret&b=2").as_deref(),
            Some("s@cret")
        );
    }

    #[test]
    fn plus_decodes_to_space() {
        assert_eq!(token_from_query("TOKEN=a+b").as_deref(), Some("a b"));
        assert_eq!(token_from_query("TOKEN=a%2Bb").as_deref(), Some("a+b"));
    }

    #[test]
    fn parameter_name_is_case_sensitive() {
        assert_eq!(token_from_query("token=secret"), None);
    }

    #[test]
    fn bare_key_is_an_empty_token() {
        assert_eq!(token_from_query("TOKEN").as_deref(), Some(""));
    }

    #[test]
    fn empty_value_is_kept() {
        assert_eq!(token_from_query("TOKEN=").as_deref(), Some(""));
    }
}
