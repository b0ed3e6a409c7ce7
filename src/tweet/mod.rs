// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The status update entity.
//!
//! A [`Tweet`] is materialized from a `status` wire node, either standalone
//! (`show_status`, `update_status`) or as an element of a timeline or search
//! result. Every field is optional on the wire; absent fields keep their
//! default. See the [`entity`][crate::entity] module for how materialization
//! works.

use crate::entity::{EntityKind, Entity, FieldSpec, FieldValue, Materialize, WireBool};
use crate::user::TwitterUser;

/// Represents a single status update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tweet {
    /// Numeric ID for this tweet.
    pub id: Option<u64>,
    /// Timestamp showing when the tweet was posted, formatted like
    /// "Wed Aug 27 13:08:45 +0000 2008". Kept opaque.
    pub created_at: Option<String>,
    /// The text of the tweet.
    pub text: Option<String>,
    /// The application used to post the tweet, as an HTML anchor tag
    /// containing the app's URL and name.
    pub source: Option<String>,
    /// Indicates whether the text was truncated by the API.
    pub truncated: Option<WireBool>,
    /// If the tweet is a reply, contains the ID of the tweet that was replied to.
    pub in_reply_to_status_id: Option<u64>,
    /// If the tweet is a reply, contains the ID of the user that was replied to.
    pub in_reply_to_user_id: Option<u64>,
    /// If the tweet is a reply, contains the screen name of the user that was
    /// replied to.
    pub in_reply_to_screen_name: Option<String>,
    /// Indicates whether the authenticated user has liked this tweet.
    pub favorited: Option<WireBool>,
    /// The user who posted this tweet. This field will be absent on tweets
    /// included as part of a `TwitterUser`.
    pub user: Option<Box<TwitterUser>>,
}

impl Materialize for Tweet {
    const KIND: EntityKind = EntityKind::Status;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::number("id"),
        FieldSpec::text("created_at"),
        FieldSpec::text("text"),
        FieldSpec::text("source"),
        FieldSpec::flag("truncated"),
        FieldSpec::number("in_reply_to_status_id"),
        FieldSpec::number("in_reply_to_user_id"),
        FieldSpec::text("in_reply_to_screen_name"),
        FieldSpec::flag("favorited"),
        FieldSpec::nested("user", EntityKind::User),
    ];

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Number(n)) => self.id = Some(n),
            ("created_at", FieldValue::Text(s)) => self.created_at = Some(s),
            ("text", FieldValue::Text(s)) => self.text = Some(s),
            ("source", FieldValue::Text(s)) => self.source = Some(s),
            ("truncated", FieldValue::Flag(b)) => self.truncated = Some(b),
            ("in_reply_to_status_id", FieldValue::Number(n)) => {
                self.in_reply_to_status_id = Some(n)
            }
            ("in_reply_to_user_id", FieldValue::Number(n)) => self.in_reply_to_user_id = Some(n),
            ("in_reply_to_screen_name", FieldValue::Text(s)) => {
                self.in_reply_to_screen_name = Some(s)
            }
            ("favorited", FieldValue::Flag(b)) => self.favorited = Some(b),
            ("user", FieldValue::Nested(Entity::User(user))) => self.user = Some(user),
            // The materializer coerces against SCHEMA before assigning, so
            // other pairings cannot be produced.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use crate::entity::Materializer;
    use crate::wire::node_from_json;

    use super::Tweet;

    fn load_tweet(path: &str) -> Tweet {
        let sample_str = {
            use std::io::Read;
            let mut file = std::fs::File::open(path).unwrap();
            let mut ret = String::new();
            file.read_to_string(&mut ret).unwrap();
            ret
        };
        let json = serde_json::from_str(&sample_str).unwrap();
        let node = node_from_json("status", &json).unwrap();
        Tweet::try_from(Materializer::new().materialize(&node).unwrap()).unwrap()
    }

    #[test]
    fn parse_basic() {
        let sample = load_tweet("src/tweet/sample-status.json");

        assert_eq!(sample.id, Some(1472669360));
        assert_eq!(
            sample.text.as_deref(),
            Some("At least I can get your humor through tweets. RT @abdur: I don't mean this in a bad way, but genetically speaking your a cul-de-sac.")
        );
        assert_eq!(
            sample.created_at.as_deref(),
            Some("Tue Apr 07 22:52:51 +0000 2009")
        );
        assert_eq!(
            sample.source.as_deref(),
            Some("<a href=\"http://www.tweetdeck.com/\">TweetDeck</a>")
        );
        assert_eq!(sample.truncated.as_ref().unwrap().as_bool(), Some(false));
        assert_eq!(sample.favorited.as_ref().unwrap().as_bool(), Some(false));
        assert!(sample.in_reply_to_status_id.is_none());

        let user = sample.user.expect("nested user missing");
        assert_eq!(user.id, Some(1401881));
        assert_eq!(user.screen_name.as_deref(), Some("dougw"));
        assert_eq!(user.followers_count, Some(1031));
        assert_eq!(user.protected.as_ref().unwrap().as_bool(), Some(false));
    }
}
