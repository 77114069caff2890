//! Operator cookies.
//!
//! The operator identity lives in two cookies:
//! - `user_name`: set at login, cleared at logout
//! - `welcome_message`: set at login, cleared after the operator page shows it once
//!
//! Values are percent-encoded so names with spaces or separators survive the
//! round trip.
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(cookies: OperatorCookies) -> String {
//!     cookies.user_name.unwrap_or_else(|| "anonymous".to_string())
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// Cookie holding the operator's name.
pub const USER_NAME_COOKIE: &str = "user_name";

/// Cookie holding the one-shot greeting shown on the operator page.
pub const WELCOME_MESSAGE_COOKIE: &str = "welcome_message";

/// Operator cookies sent with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorCookies {
    /// Operator name, if logged in
    pub user_name: Option<String>,
    /// Greeting to show once
    pub welcome_message: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for OperatorCookies
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

impl OperatorCookies {
    /// Reads the operator cookies from every `Cookie` header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::default();

        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='));

        for (name, value) in pairs {
            let Ok(decoded) = urlencoding::decode(value.trim_matches('"')) else {
                continue;
            };
            if decoded.is_empty() {
                continue;
            }
            match name {
                USER_NAME_COOKIE => cookies.user_name = Some(decoded.into_owned()),
                WELCOME_MESSAGE_COOKIE => cookies.welcome_message = Some(decoded.into_owned()),
                _ => {},
            }
        }

        cookies
    }
}

/// `Set-Cookie` value storing `value` under `name` for the whole site.
#[must_use]
pub fn set_cookie(name: &str, value: &str) -> String {
    format!(
        "{name}={}; Path=/; HttpOnly; SameSite=Lax",
        urlencoding::encode(value)
    )
}

/// `Set-Cookie` value deleting the cookie `name`.
#[must_use]
pub fn remove_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
