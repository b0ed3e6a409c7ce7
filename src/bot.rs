// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A simple Twitter bot, designed to be run on a regular basis.
//!
//! A [`TwitterBot`] wraps a [`TwitterClient`] with a handful of decision
//! rules: retweet the first search hit not authored by the bot itself,
//! follow back new followers up to a cap, feed timeline statuses or direct
//! messages to caller-supplied handlers. Handlers steer the iteration
//! through the [`Flow`] enum instead of raising control-flow exceptions.
//!
//! This bot is *not* intended to be used for spam purposes.

use crate::client::TwitterClient;
use crate::direct::DirectMessage;
use crate::entity::TweetCollection;
use crate::error::{Error, Result};
use crate::tweet::Tweet;

/// The maximum length of a status update, in characters.
pub const MAX_STATUS_LEN: usize = 140;

/// The most accounts a bot will let itself follow.
pub const MAX_FOLLOWING: u64 = 2000;

/// What a timeline handler wants to happen after seeing one tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going with the next element.
    Continue,
    /// Skip this element without counting it as processed.
    Skip,
    /// Stop processing entirely.
    Stop,
}

/// The timeline a bot operation reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSource {
    /// The bot's own timeline.
    Public,
    /// The timeline of the bot's friends.
    Friends,
}

impl Default for TimelineSource {
    fn default() -> Self {
        TimelineSource::Public
    }
}

/// Options for [`TwitterBot::search_and_retweet`].
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// The template used to format the retweet. `{user}` and `{text}` are
    /// replaced with the original author and text.
    pub template: String,
    /// Whether the bot should follow the original author.
    pub follow: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            template: "RT @{user}: {text}".to_string(),
            follow: false,
        }
    }
}

/// A configured bot bound to one Twitter account.
pub struct TwitterBot {
    client: TwitterClient,
    username: String,
}

impl TwitterBot {
    /// Creates a bot for the given account.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        tracing::debug!(bot = %username, "creating bot");
        TwitterBot {
            client: TwitterClient::with_credentials(username.clone(), password),
            username,
        }
    }

    /// Creates a bot around an existing client, e.g. one pointed at a
    /// non-default base URL.
    pub fn with_client(client: TwitterClient, username: impl Into<String>) -> Self {
        TwitterBot {
            client,
            username: username.into(),
        }
    }

    /// The bot's account name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The underlying API client.
    pub fn client(&self) -> &TwitterClient {
        &self.client
    }

    /// Searches for statuses matching the given terms and reposts the first
    /// hit not authored by the bot itself, formatted through
    /// `options.template` and truncated to [`MAX_STATUS_LEN`]. Optionally
    /// follows the original author; a follow failure is logged, not fatal.
    /// Returns the posted status.
    pub async fn search_and_retweet(
        &self,
        terms: &str,
        options: &SearchOptions,
    ) -> Result<Tweet> {
        if terms.is_empty() || terms.chars().count() > MAX_STATUS_LEN {
            return Err(Error::InvalidInput(format!(
                "search terms must be a non-empty string of at most {} chars",
                MAX_STATUS_LEN
            )));
        }

        tracing::debug!(bot = %self.username, terms, "starting search_and_retweet");

        let hits = self.client.search(terms).await?;
        tracing::debug!(count = hits.len(), "search results received");

        let hit = pick_foreign(&self.username, &hits).ok_or_else(|| {
            Error::InvalidInput("no valid message found matching the search terms".to_string())
        })?;
        let author = hit
            .user
            .as_ref()
            .and_then(|user| user.screen_name.as_deref())
            .unwrap_or_default()
            .to_string();
        let text = hit.text.as_deref().unwrap_or_default();

        let message = truncate_text(
            render_template(&options.template, &author, text).trim(),
            MAX_STATUS_LEN,
        );
        tracing::debug!(%message, "posting retweet");
        let posted = self.client.update_status(&message, None).await?;

        if options.follow && !self.client.exists_friendship(&self.username, &author).await? {
            tracing::debug!(user = %author, "following original author");
            if let Err(err) = self.client.create_friendship(&author, true).await {
                tracing::warn!(user = %author, error = %err, "could not follow author");
            }
        }

        Ok(posted)
    }

    /// Follows back every follower the bot is not already befriended with,
    /// bounded by [`MAX_FOLLOWING`]. Per-follower failures are logged and
    /// skipped. Returns the number of new friendships created.
    pub async fn follow_followers(&self) -> Result<u64> {
        tracing::debug!(bot = %self.username, "checking for followers");

        let account = self.client.verify_credentials().await?;
        let friends_count = account.friends_count.unwrap_or(0);
        let mut added = 0;

        for follower in &self.client.followers(None).await? {
            let follower_name = match follower.screen_name.as_deref() {
                Some(name) => name,
                None => continue,
            };

            if friends_count + added >= MAX_FOLLOWING {
                tracing::debug!("max following reached, skipping mass following");
                return Ok(added);
            }

            if self
                .client
                .exists_friendship(&self.username, follower_name)
                .await?
            {
                continue;
            }

            match self.client.create_friendship(follower_name, true).await {
                Ok(_) => {
                    tracing::debug!(user = %follower_name, "following new follower");
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!(user = %follower_name, error = %err, "skipping follower");
                }
            }
        }

        tracing::debug!(added, "followers added");
        Ok(added)
    }

    /// Feeds each status of the chosen timeline to the handler, which steers
    /// the iteration through the returned [`Flow`]. Returns the number of
    /// statuses the handler accepted.
    pub async fn process_timeline(
        &self,
        source: TimelineSource,
        max: u32,
        mut handler: impl FnMut(&Tweet) -> Flow,
    ) -> Result<usize> {
        tracing::debug!(bot = %self.username, ?source, "processing timeline");

        let statuses = match source {
            TimelineSource::Public => {
                self.client.user_timeline(None, None, Some(max), None).await?
            }
            TimelineSource::Friends => {
                self.client.friends_timeline(None, Some(max), None).await?
            }
        };

        let mut processed = 0;
        for tweet in &statuses {
            match handler(tweet) {
                Flow::Continue => processed += 1,
                Flow::Skip => continue,
                Flow::Stop => break,
            }
        }
        Ok(processed)
    }

    /// Feeds each pending direct message to the handler. A `Some(reply)`
    /// answer is sent back — privately as a DM when `reply_privately` is
    /// set, publicly as a truncated status update otherwise — and the
    /// processed message is deleted. An empty or `None` answer skips the
    /// message. Failures follow `stop_on_error`. Returns the number of
    /// messages answered.
    pub async fn process_direct_messages(
        &self,
        mut handler: impl FnMut(&DirectMessage) -> Result<Option<String>>,
        reply_privately: bool,
        stop_on_error: bool,
    ) -> Result<usize> {
        let messages = self.client.direct_messages(None, None).await?;
        if messages.is_empty() {
            tracing::debug!("no direct messages waiting to be processed");
            return Ok(0);
        }

        let mut processed = 0;
        for message in &messages {
            let outcome = self
                .answer_direct_message(message, &mut handler, reply_privately)
                .await;
            match outcome {
                Ok(true) => processed += 1,
                Ok(false) => continue,
                Err(err) => {
                    if stop_on_error {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, "direct message processing failed");
                }
            }
        }
        Ok(processed)
    }

    async fn answer_direct_message(
        &self,
        message: &DirectMessage,
        handler: &mut impl FnMut(&DirectMessage) -> Result<Option<String>>,
        reply_privately: bool,
    ) -> Result<bool> {
        let sender = message
            .sender
            .as_ref()
            .and_then(|user| user.screen_name.as_deref());
        tracing::debug!(
            sender = sender.unwrap_or(""),
            text = message.text.as_deref().unwrap_or(""),
            "processing direct message"
        );

        let reply = match handler(message)? {
            Some(reply) if !reply.is_empty() => reply,
            _ => return Ok(false),
        };

        if reply_privately {
            let sender = sender.ok_or(Error::MissingValue("sender"))?;
            self.client.send_direct_message(sender, &reply).await?;
        } else {
            self.client
                .update_status(&truncate_text(&reply, MAX_STATUS_LEN), None)
                .await?;
        }

        if let Some(id) = message.id {
            self.client.delete_direct_message(id).await?;
        }
        Ok(true)
    }
}

/// Picks the first tweet not authored by the given account, matching
/// case-insensitively on the author's screen name.
fn pick_foreign<'a>(username: &str, hits: &'a TweetCollection) -> Option<&'a Tweet> {
    hits.iter().find(|tweet| {
        tweet
            .user
            .as_ref()
            .and_then(|user| user.screen_name.as_deref())
            .map(|name| !name.eq_ignore_ascii_case(username))
            .unwrap_or(false)
    })
}

/// Replaces the `{user}` and `{text}` placeholders of a retweet template.
fn render_template(template: &str, user: &str, text: &str) -> String {
    template.replace("{user}", user).replace("{text}", text)
}

/// Truncates the text to at most `max` characters, appending an ellipsis
/// when something was cut.
fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max - 1).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TweetCollection;
    use crate::user::TwitterUser;

    fn tweet(author: &str, text: &str) -> Tweet {
        Tweet {
            text: Some(text.to_string()),
            user: Some(Box::new(TwitterUser {
                screen_name: Some(author.to_string()),
                ..TwitterUser::default()
            })),
            ..Tweet::default()
        }
    }

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate_text("short", 140), "short");
        let exact: String = "x".repeat(140);
        assert_eq!(truncate_text(&exact, 140), exact);
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let long: String = "é".repeat(141);
        let truncated = truncate_text(&long, 140);
        assert_eq!(truncated.chars().count(), 140);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn template_renders_author_and_text() {
        assert_eq!(
            render_template("RT @{user}: {text}", "alice", "hello"),
            "RT @alice: hello"
        );
        assert_eq!(render_template("{text}", "alice", "hi"), "hi");
    }

    #[test]
    fn foreign_pick_skips_self_authored_tweets() {
        let hits = TweetCollection::from(vec![
            tweet("MyBot", "me first"),
            tweet("mybot", "still me"),
            tweet("stranger", "pick me"),
        ]);
        let picked = pick_foreign("mybot", &hits).expect("no tweet picked");
        assert_eq!(picked.text.as_deref(), Some("pick me"));
    }

    #[test]
    fn foreign_pick_ignores_tweets_without_author() {
        let mut orphan = tweet("x", "no author");
        orphan.user = None;
        let hits = TweetCollection::from(vec![orphan, tweet("other", "hi")]);
        let picked = pick_foreign("mybot", &hits).expect("no tweet picked");
        assert_eq!(picked.text.as_deref(), Some("hi"));
    }

    #[test]
    fn foreign_pick_gives_up_on_all_self() {
        let hits = TweetCollection::from(vec![tweet("mybot", "me")]);
        assert!(pick_foreign("mybot", &hits).is_none());
    }
}
