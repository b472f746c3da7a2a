//! Request headers forwarded, untouched, on every downstream call.

use reqwest::RequestBuilder;
use uuid::Uuid;

pub const HEADER_GUID: &str = "x-guid";
pub const HEADER_CHANNEL: &str = "x-channel";
pub const HEADER_MEDIUM: &str = "x-medium";
pub const HEADER_APP: &str = "x-app";
pub const HEADER_SESSION: &str = "x-session";
pub const HEADER_AUTHORIZATION: &str = "authorization";

/// Correlation and auth headers of the inbound request.
///
/// Opaque to the aggregation layer: values are trimmed once on construction
/// and then only forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    correlation_id: String,
    channel: String,
    medium: String,
    app: String,
    session: String,
    token: String,
}

impl CallContext {
    pub fn new(
        correlation_id: Option<&str>,
        channel: Option<&str>,
        medium: Option<&str>,
        app: Option<&str>,
        session: Option<&str>,
        token: Option<&str>,
    ) -> Self {
        fn clean(value: Option<&str>) -> String {
            value.map(str::trim).unwrap_or_default().to_string()
        }

        Self {
            correlation_id: clean(correlation_id),
            channel: clean(channel),
            medium: clean(medium),
            app: clean(app),
            session: clean(session),
            token: clean(token),
        }
    }

    /// Context with a fresh correlation id, for calls that do not originate
    /// from an inbound request.
    pub fn generated(app: &str, token: Option<&str>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        Self::new(
            Some(&correlation_id),
            Some("CLI"),
            None,
            Some(app),
            None,
            token,
        )
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Header name/value pairs in the order they are applied
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (HEADER_GUID, self.correlation_id.clone()),
            (HEADER_CHANNEL, self.channel.clone()),
            (HEADER_MEDIUM, self.medium.clone()),
            (HEADER_APP, self.app.clone()),
            (HEADER_SESSION, self.session.clone()),
        ];
        if !self.token.is_empty() {
            headers.push((HEADER_AUTHORIZATION, format!("Bearer {}", self.token)));
        }
        headers
    }

    pub fn apply_to(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in self.headers() {
            request = request.header(name, value);
        }
        request
    }
}
