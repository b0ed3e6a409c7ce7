// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The HTTP transport behind the API client.
//!
//! [`ApiServer`] is a thin proxy around the Twitter REST endpoints: it knows
//! how to assemble a request for an API path, attach HTTP Basic credentials
//! when the call requires them, and hand back the raw response body. It does
//! not interpret bodies; normalization and materialization happen in the
//! [`client`][crate::client] that owns the server.

use std::time::Duration;

use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use hyper::{Body, Method, Request};
use hyper_tls::HttpsConnector;
use url::Url;

use crate::common::ParamList;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1";
const DEFAULT_USER_AGENT: &str = concat!("tweetbot/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// A proxy to a Twitter-API-compatible HTTP server.
pub struct ApiServer {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    user_agent: String,
    timeout: Duration,
    client: hyper::Client<HttpsConnector<HttpConnector>>,
}

impl ApiServer {
    /// Creates a server proxy pointing at the default API base URL.
    pub fn new() -> Self {
        ApiServer {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: hyper::Client::builder().build(HttpsConnector::new()),
        }
    }

    /// Points the proxy at a different base URL, e.g. an API-compatible
    /// service or a local test double. Fails when the URL does not parse.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        Url::parse(base_url)?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Sets the credentials used for authenticated calls.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Overrides the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The username configured for authenticated calls, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Sends a request to the server and returns the response body.
    ///
    /// `api_path` is relative to the base URL (e.g.
    /// `statuses/update.json`). For GET requests the parameters are appended
    /// as a query string; for POST they are sent as an
    /// `application/x-www-form-urlencoded` body. A non-2xx response is
    /// `Error::BadStatus`; exceeding the configured timeout is
    /// `Error::TimedOut`.
    pub async fn request(
        &self,
        api_path: &str,
        params: &ParamList,
        method: Method,
        authenticate: bool,
    ) -> Result<String> {
        let query = params.to_urlencoded();
        let url = request_url(&self.base_url, api_path, &method, &query);

        tracing::debug!(method = %method, url = %url, "sending request");

        let mut request = Request::builder()
            .method(method.clone())
            .uri(&url)
            .header(USER_AGENT, &self.user_agent);

        if authenticate {
            let (username, password) = match (&self.username, &self.password) {
                (Some(username), Some(password)) => (username, password),
                _ => return Err(Error::MissingCredentials),
            };
            request = request.header(AUTHORIZATION, basic_auth(username, password));
        }

        let request = if method == Method::POST && !query.is_empty() {
            request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(query))?
        } else {
            request.body(Body::empty())?
        };

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| Error::TimedOut)??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::BadStatus(status));
        }

        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            Error::InvalidResponse("response body was not valid UTF-8", None)
        })
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new()
    }
}

fn request_url(base_url: &str, api_path: &str, method: &Method, query: &str) -> String {
    let url = format!("{}/{}", base_url, api_path.trim_start_matches('/'));
    if *method == Method::GET && !query.is_empty() {
        format!("{}?{}", url, query)
    } else {
        url
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        base64::encode(format!("{}:{}", username, password))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_urls_carry_the_query_string() {
        let params = ParamList::new().add_param("screen_name", "rustlang");
        let url = request_url(
            "https://api.twitter.com/1",
            "users/show.json",
            &Method::GET,
            &params.to_urlencoded(),
        );
        assert_eq!(
            url,
            "https://api.twitter.com/1/users/show.json?screen_name=rustlang"
        );
    }

    #[test]
    fn post_urls_leave_params_to_the_body() {
        let url = request_url(
            "https://api.twitter.com/1",
            "statuses/update.json",
            &Method::POST,
            "status=hi",
        );
        assert_eq!(url, "https://api.twitter.com/1/statuses/update.json");
    }

    #[test]
    fn basic_auth_header_is_base64_of_credentials() {
        // echo -n 'bot:s3cret' | base64
        assert_eq!(basic_auth("bot", "s3cret"), "Basic Ym90OnMzY3JldA==");
    }

    #[test]
    fn bad_base_urls_are_rejected() {
        assert!(ApiServer::new().with_base_url("not a url").is_err());
        assert!(ApiServer::new()
            .with_base_url("https://example.com/api/")
            .is_ok());
    }
}
