// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A library to interact with the classic Twitter REST API, plus a small
//! bot toolkit built on top of it.
//!
//! The crate is organized in three layers:
//!
//! - **Transport**: [`server::ApiServer`] performs the HTTP exchanges with
//!   an API-compatible server, handling Basic authentication, timeouts and
//!   status checking.
//! - **Materialization**: API responses are normalized into a
//!   [`wire::WireNode`] tree and turned into typed entities by the
//!   [`entity::Materializer`], driven by per-entity field schemas. Unknown
//!   wire types and unknown fields are hard errors; a response that does not
//!   match the schemas never half-materializes.
//! - **Operations**: [`client::TwitterClient`] exposes one method per API
//!   call, [`bot::TwitterBot`] layers bot behavior (retweeting search hits,
//!   following back followers, answering direct messages) on the client, and
//!   [`farm::Farm`] runs whole YAML-configured collections of bots on a
//!   periodicity schedule.
//!
//! ## Getting started
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> tweetbot::Result<()> {
//! use tweetbot::TwitterClient;
//!
//! let client = TwitterClient::with_credentials("mybot", "s3cret");
//! let tweet = client.update_status("hello from tweetbot", None).await?;
//! println!("posted status {}", tweet.id.unwrap_or(0));
//! # Ok(())
//! # }
//! ```
//!
//! Entities can also be materialized without any network involvement, which
//! is how the test suites of this crate exercise them:
//!
//! ```
//! use std::convert::TryFrom;
//! use tweetbot::entity::Materializer;
//! use tweetbot::tweet::Tweet;
//! use tweetbot::wire::node_from_json;
//!
//! # fn main() -> tweetbot::Result<()> {
//! let json = serde_json::json!({"id": 42, "text": "hi"});
//! let node = node_from_json("status", &json)?;
//! let tweet = Tweet::try_from(Materializer::new().materialize(&node)?)?;
//! assert_eq!(tweet.text.as_deref(), Some("hi"));
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod client;
pub mod common;
pub mod direct;
pub mod entity;
pub mod error;
pub mod farm;
pub mod server;
pub mod tweet;
pub mod user;
pub mod wire;

pub use crate::bot::TwitterBot;
pub use crate::client::TwitterClient;
pub use crate::direct::DirectMessage;
pub use crate::entity::{Entity, Materializer};
pub use crate::error::{Error, Result};
pub use crate::farm::Farm;
pub use crate::server::ApiServer;
pub use crate::tweet::Tweet;
pub use crate::user::TwitterUser;
