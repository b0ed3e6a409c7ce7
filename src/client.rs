// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The high-level API client.
//!
//! [`TwitterClient`] exposes one method per API operation. Each method
//! assembles the call parameters, lets the [`ApiServer`] perform the HTTP
//! exchange, normalizes the JSON body into a wire tree and materializes it
//! into the typed entity the operation promises. A response carrying an
//! `error` member is surfaced as [`Error::Api`] before any materialization
//! is attempted.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> tweetbot::error::Result<()> {
//! use tweetbot::client::TwitterClient;
//!
//! let client = TwitterClient::with_credentials("mybot", "s3cret");
//! let timeline = client.user_timeline(None, None, Some(5), None).await?;
//! for tweet in &timeline {
//!     println!("{}", tweet.text.as_deref().unwrap_or(""));
//! }
//! # Ok(())
//! # }
//! ```

use std::convert::TryFrom;

use hyper::Method;
use serde_json::Value;

use crate::common::{MapString, ParamList};
use crate::direct::DirectMessage;
use crate::entity::{
    DirectMessageCollection, Entity, Materializer, TweetCollection, UserCollection,
};
use crate::error::{Error, Result};
use crate::server::ApiServer;
use crate::tweet::Tweet;
use crate::user::TwitterUser;
use crate::wire::{self, WireNode};

/// A client for the Twitter REST API.
pub struct TwitterClient {
    server: ApiServer,
    materializer: Materializer,
}

impl TwitterClient {
    /// Creates a client around the given server proxy.
    pub fn new(server: ApiServer) -> Self {
        TwitterClient {
            server,
            materializer: Materializer::new(),
        }
    }

    /// Creates a client against the default API endpoint with the given
    /// credentials.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(ApiServer::new().with_credentials(username, password))
    }

    /// The username configured for authenticated calls, if any.
    pub fn username(&self) -> Option<&str> {
        self.server.username()
    }

    /// Returns the 20 most recent statuses from non-protected users.
    pub async fn public_timeline(&self) -> Result<TweetCollection> {
        let body = self
            .server
            .request("statuses/public_timeline.json", &ParamList::new(), Method::GET, false)
            .await?;
        TweetCollection::try_from(self.entity(&body, "statuses")?)
    }

    /// Returns the most recent statuses posted by the authenticated user and
    /// their friends.
    pub async fn friends_timeline(
        &self,
        since_id: Option<u64>,
        count: Option<u32>,
        page: Option<u32>,
    ) -> Result<TweetCollection> {
        let params = ParamList::new()
            .add_opt_param("since_id", since_id.map_string())
            .add_opt_param("count", count.map_string())
            .add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("statuses/friends_timeline.json", &params, Method::GET, true)
            .await?;
        TweetCollection::try_from(self.entity(&body, "statuses")?)
    }

    /// Returns the most recent statuses posted by the given user, or by the
    /// authenticated user when no screen name is given.
    pub async fn user_timeline(
        &self,
        screen_name: Option<&str>,
        since_id: Option<u64>,
        count: Option<u32>,
        page: Option<u32>,
    ) -> Result<TweetCollection> {
        let params = ParamList::new()
            .add_opt_param("screen_name", screen_name.map(str::to_string))
            .add_opt_param("since_id", since_id.map_string())
            .add_opt_param("count", count.map_string())
            .add_opt_param("page", page.map_string());
        // Public profiles can be read anonymously; the authenticated user's
        // own timeline cannot.
        let authenticate = screen_name.is_none();
        let body = self
            .server
            .request("statuses/user_timeline.json", &params, Method::GET, authenticate)
            .await?;
        TweetCollection::try_from(self.entity(&body, "statuses")?)
    }

    /// Returns the most recent replies to the authenticated user.
    pub async fn replies(&self, page: Option<u32>) -> Result<TweetCollection> {
        let params = ParamList::new().add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("statuses/replies.json", &params, Method::GET, true)
            .await?;
        TweetCollection::try_from(self.entity(&body, "statuses")?)
    }

    /// Returns a single status by ID.
    pub async fn show_status(&self, id: u64) -> Result<Tweet> {
        let body = self
            .server
            .request(
                &format!("statuses/show/{}.json", id),
                &ParamList::new(),
                Method::GET,
                false,
            )
            .await?;
        Tweet::try_from(self.entity(&body, "status")?)
    }

    /// Posts a status update, optionally as a reply to another status.
    /// Returns the created status.
    pub async fn update_status(&self, status: &str, in_reply_to: Option<u64>) -> Result<Tweet> {
        let params = ParamList::new()
            .add_param("status", status.to_string())
            .add_opt_param("in_reply_to_status_id", in_reply_to.map_string());
        let body = self
            .server
            .request("statuses/update.json", &params, Method::POST, true)
            .await?;
        Tweet::try_from(self.entity(&body, "status")?)
    }

    /// Deletes a status owned by the authenticated user. Returns the deleted
    /// status.
    pub async fn delete_status(&self, id: u64) -> Result<Tweet> {
        let body = self
            .server
            .request(
                &format!("statuses/destroy/{}.json", id),
                &ParamList::new(),
                Method::POST,
                true,
            )
            .await?;
        Tweet::try_from(self.entity(&body, "status")?)
    }

    /// Whether the authenticated user already posted the given text among
    /// their `max` most recent statuses.
    pub async fn is_duplicate_status(&self, text: &str, max: u32) -> Result<bool> {
        let recent = self.user_timeline(None, None, Some(max), None).await?;
        Ok(recent.iter().any(|tweet| tweet.text.as_deref() == Some(text)))
    }

    /// Returns the users the given user follows, or the authenticated user's
    /// friends when no screen name is given.
    pub async fn friends(
        &self,
        screen_name: Option<&str>,
        page: Option<u32>,
    ) -> Result<UserCollection> {
        let params = ParamList::new()
            .add_opt_param("screen_name", screen_name.map(str::to_string))
            .add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("statuses/friends.json", &params, Method::GET, screen_name.is_none())
            .await?;
        UserCollection::try_from(self.entity(&body, "users")?)
    }

    /// Returns the authenticated user's followers.
    pub async fn followers(&self, page: Option<u32>) -> Result<UserCollection> {
        let params = ParamList::new().add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("statuses/followers.json", &params, Method::GET, true)
            .await?;
        UserCollection::try_from(self.entity(&body, "users")?)
    }

    /// Returns a single user profile by screen name.
    pub async fn show_user(&self, screen_name: &str) -> Result<TwitterUser> {
        let params = ParamList::new().add_param("screen_name", screen_name.to_string());
        let body = self
            .server
            .request("users/show.json", &params, Method::GET, true)
            .await?;
        TwitterUser::try_from(self.entity(&body, "user")?)
    }

    /// Checks the configured credentials and returns the authenticated
    /// user's profile.
    pub async fn verify_credentials(&self) -> Result<TwitterUser> {
        let body = self
            .server
            .request("account/verify_credentials.json", &ParamList::new(), Method::GET, true)
            .await?;
        TwitterUser::try_from(self.entity(&body, "user")?)
    }

    /// Returns the direct messages sent to the authenticated user.
    pub async fn direct_messages(
        &self,
        since_id: Option<u64>,
        page: Option<u32>,
    ) -> Result<DirectMessageCollection> {
        let params = ParamList::new()
            .add_opt_param("since_id", since_id.map_string())
            .add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("direct_messages.json", &params, Method::GET, true)
            .await?;
        DirectMessageCollection::try_from(self.entity(&body, "direct_messages")?)
    }

    /// Returns the direct messages sent by the authenticated user.
    pub async fn sent_direct_messages(
        &self,
        since_id: Option<u64>,
        page: Option<u32>,
    ) -> Result<DirectMessageCollection> {
        let params = ParamList::new()
            .add_opt_param("since_id", since_id.map_string())
            .add_opt_param("page", page.map_string());
        let body = self
            .server
            .request("direct_messages/sent.json", &params, Method::GET, true)
            .await?;
        DirectMessageCollection::try_from(self.entity(&body, "direct_messages")?)
    }

    /// Sends a direct message to the given user. Returns the sent message.
    pub async fn send_direct_message(
        &self,
        screen_name: &str,
        text: &str,
    ) -> Result<DirectMessage> {
        let params = ParamList::new()
            .add_param("user", screen_name.to_string())
            .add_param("text", text.to_string());
        let body = self
            .server
            .request("direct_messages/new.json", &params, Method::POST, true)
            .await?;
        DirectMessage::try_from(self.entity(&body, "direct_message")?)
    }

    /// Deletes a direct message received by the authenticated user. Returns
    /// the deleted message.
    pub async fn delete_direct_message(&self, id: u64) -> Result<DirectMessage> {
        let body = self
            .server
            .request(
                &format!("direct_messages/destroy/{}.json", id),
                &ParamList::new(),
                Method::POST,
                true,
            )
            .await?;
        DirectMessage::try_from(self.entity(&body, "direct_message")?)
    }

    /// Befriends the given user, optionally enabling notifications. Returns
    /// the befriended profile.
    pub async fn create_friendship(&self, screen_name: &str, follow: bool) -> Result<TwitterUser> {
        let params = ParamList::new()
            .add_param("screen_name", screen_name.to_string())
            .add_param("follow", follow.to_string());
        let body = self
            .server
            .request("friendships/create.json", &params, Method::POST, true)
            .await?;
        TwitterUser::try_from(self.entity(&body, "user")?)
    }

    /// Unfriends the given user. Returns the unfriended profile.
    pub async fn delete_friendship(&self, screen_name: &str) -> Result<TwitterUser> {
        let params = ParamList::new().add_param("screen_name", screen_name.to_string());
        let body = self
            .server
            .request("friendships/destroy.json", &params, Method::POST, true)
            .await?;
        TwitterUser::try_from(self.entity(&body, "user")?)
    }

    /// Whether `user_a` follows `user_b`.
    pub async fn exists_friendship(&self, user_a: &str, user_b: &str) -> Result<bool> {
        let params = ParamList::new()
            .add_param("user_a", user_a.to_string())
            .add_param("user_b", user_b.to_string());
        let body = self
            .server
            .request("friendships/exists.json", &params, Method::GET, true)
            .await?;
        parse_exists(&body)
    }

    /// Searches recent statuses for the given terms.
    ///
    /// The search endpoint answers a bespoke shape (`results` elements with
    /// a flat `from_user`); the response is reshaped into a regular status
    /// collection before materialization.
    pub async fn search(&self, terms: &str) -> Result<TweetCollection> {
        let params = ParamList::new().add_param("q", terms.to_string());
        let body = self
            .server
            .request("search.json", &params, Method::GET, false)
            .await?;
        let json = parse_body(&body)?;
        let node = search_node(&json)?;
        TweetCollection::try_from(self.materializer.materialize(&node)?)
    }

    /// Parses a response body and materializes it as the entity named by
    /// `tag`.
    fn entity(&self, body: &str, tag: &str) -> Result<Entity> {
        let json = parse_body(body)?;
        let node = wire::node_from_json(tag, &json)?;
        self.materializer.materialize(&node)
    }
}

/// Parses a JSON body, surfacing an API-level `error` member as
/// `Error::Api`.
fn parse_body(body: &str) -> Result<Value> {
    let json: Value = serde_json::from_str(body)?;
    if let Some(message) = json.get("error").and_then(Value::as_str) {
        return Err(Error::Api(message.to_string()));
    }
    Ok(json)
}

/// Parses the bare boolean body of `friendships/exists`.
fn parse_exists(body: &str) -> Result<bool> {
    match parse_body(body)? {
        Value::Bool(value) => Ok(value),
        other => Err(Error::InvalidResponse(
            "expected a boolean response",
            Some(other.to_string()),
        )),
    }
}

/// Reshapes a search response into a `statuses` wire tree.
fn search_node(json: &Value) -> Result<WireNode> {
    let results = json
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::InvalidResponse("search response missing results", Some(json.to_string()))
        })?;

    let mut node = WireNode::new("statuses");
    for result in results {
        let mut status = WireNode::new("status");
        for field in &["id", "created_at", "text"] {
            if let Some(value) = result.get(*field).filter(|value| !value.is_null()) {
                status = status.leaf(*field, wire::json_leaf(value));
            }
        }
        if let Some(from_user) = result.get("from_user").and_then(Value::as_str) {
            status = status.child(WireNode::new("user").leaf("screen_name", from_user));
        }
        node = node.child(status);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwitterClient {
        TwitterClient::new(ApiServer::new())
    }

    #[test]
    fn api_errors_short_circuit_materialization() {
        let body = r#"{"error": "Could not authenticate you."}"#;
        match client().entity(body, "statuses") {
            Err(Error::Api(message)) => assert_eq!(message, "Could not authenticate you."),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn timeline_body_materializes_in_order() {
        let body = r#"[
            {"id": 2, "text": "newer", "user": {"screen_name": "a"}},
            {"id": 1, "text": "older", "user": {"screen_name": "b"}}
        ]"#;
        let statuses = TweetCollection::try_from(client().entity(body, "statuses").unwrap())
            .unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses.at(0).unwrap().id, Some(2));
        assert_eq!(statuses.at(1).unwrap().text.as_deref(), Some("older"));
    }

    #[test]
    fn exists_parses_bare_booleans() {
        assert!(parse_exists("true").unwrap());
        assert!(!parse_exists("false").unwrap());
        assert!(parse_exists(r#"{"friends": true}"#).is_err());
    }

    #[test]
    fn search_results_reshape_into_statuses() {
        let json: Value = serde_json::from_str(
            r#"{"results": [
                {"id": 10, "created_at": "Mon, 06 Jul 2009 22:19:05 +0000", "text": "first hit", "from_user": "alice"},
                {"id": 11, "text": "second hit", "from_user": "bob"}
            ]}"#,
        )
        .unwrap();
        let node = search_node(&json).unwrap();
        let statuses =
            TweetCollection::try_from(Materializer::new().materialize(&node).unwrap()).unwrap();

        assert_eq!(statuses.len(), 2);
        let first = statuses.at(0).unwrap();
        assert_eq!(first.id, Some(10));
        assert_eq!(first.text.as_deref(), Some("first hit"));
        assert_eq!(
            first.user.as_ref().unwrap().screen_name.as_deref(),
            Some("alice")
        );
        assert_eq!(
            statuses.at(1).unwrap().user.as_ref().unwrap().screen_name.as_deref(),
            Some("bob")
        );
    }

    #[test]
    fn search_without_results_member_is_invalid() {
        let json: Value = serde_json::from_str(r#"{"statuses": []}"#).unwrap();
        assert!(matches!(
            search_node(&json),
            Err(Error::InvalidResponse(..))
        ));
    }
}
