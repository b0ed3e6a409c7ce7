// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The user profile entity.
//!
//! A [`TwitterUser`] is materialized from a `user` wire node (also from the
//! `sender`/`recipient` nodes embedded in direct messages). A profile may in
//! turn embed the user's last status, so materialization recurses back into
//! the status schema for that field.

use crate::entity::{EntityKind, Entity, FieldSpec, FieldValue, Materialize, WireBool};
use crate::error::{Error, Result};
use crate::tweet::Tweet;

/// Represents a Twitter user.
///
/// The `screen_name` is the only attribute the API guarantees: a profile
/// without one (or with an empty one) fails materialization with
/// `MissingValue("screen_name")`. Everything else defaults when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwitterUser {
    /// Numeric ID for this user.
    pub id: Option<u64>,
    /// Display name for this user.
    pub name: Option<String>,
    /// Screen name or handle, identifying this user.
    ///
    /// Screen names are unique per-user but can be changed.
    pub screen_name: Option<String>,
    /// The user-entered location field from their profile. Not necessarily a
    /// real place.
    pub location: Option<String>,
    /// The user-entered `description` from their profile.
    pub description: Option<String>,
    /// A URL pointing to this user's profile image.
    pub profile_image_url: Option<String>,
    /// The URL provided on this user's profile.
    pub url: Option<String>,
    /// Indicates whether this user's tweets are visible only to their
    /// followers.
    pub protected: Option<WireBool>,
    /// The number of followers this user has.
    pub followers_count: Option<u64>,
    /// The number of users this user is following.
    pub friends_count: Option<u64>,
    /// The number of tweets (including retweets) this user has posted.
    pub statuses_count: Option<u64>,
    /// The number of tweets this user has liked.
    pub favourites_count: Option<u64>,
    /// Timestamp showing when this account was created. Kept opaque.
    pub created_at: Option<String>,
    /// The user's most recent tweet, if the response embedded one.
    pub status: Option<Box<Tweet>>,
}

impl Materialize for TwitterUser {
    const KIND: EntityKind = EntityKind::User;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::number("id"),
        FieldSpec::text("name"),
        FieldSpec::text("screen_name"),
        FieldSpec::text("location"),
        FieldSpec::text("description"),
        FieldSpec::text("profile_image_url"),
        FieldSpec::text("url"),
        FieldSpec::flag("protected"),
        FieldSpec::number("followers_count"),
        FieldSpec::number("friends_count"),
        FieldSpec::number("statuses_count"),
        FieldSpec::number("favourites_count"),
        FieldSpec::text("created_at"),
        FieldSpec::nested("status", EntityKind::Status),
    ];

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Number(n)) => self.id = Some(n),
            ("name", FieldValue::Text(s)) => self.name = Some(s),
            ("screen_name", FieldValue::Text(s)) => self.screen_name = Some(s),
            ("location", FieldValue::Text(s)) => self.location = Some(s),
            ("description", FieldValue::Text(s)) => self.description = Some(s),
            ("profile_image_url", FieldValue::Text(s)) => self.profile_image_url = Some(s),
            ("url", FieldValue::Text(s)) => self.url = Some(s),
            ("protected", FieldValue::Flag(b)) => self.protected = Some(b),
            ("followers_count", FieldValue::Number(n)) => self.followers_count = Some(n),
            ("friends_count", FieldValue::Number(n)) => self.friends_count = Some(n),
            ("statuses_count", FieldValue::Number(n)) => self.statuses_count = Some(n),
            ("favourites_count", FieldValue::Number(n)) => self.favourites_count = Some(n),
            ("created_at", FieldValue::Text(s)) => self.created_at = Some(s),
            ("status", FieldValue::Nested(Entity::Status(status))) => self.status = Some(status),
            _ => {}
        }
    }

    fn finish(&self) -> Result<()> {
        match self.screen_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(Error::MissingValue("screen_name")),
        }
    }
}
