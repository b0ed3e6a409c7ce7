// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The direct message entity.
//!
//! Note that direct message access requires the account credentials used for
//! the call to be one of the two parties. A [`DirectMessage`] embeds two user
//! profiles, materialized from the `sender` and `recipient` sub-trees; the
//! two are always distinct entities even when their field values coincide.

use crate::entity::{EntityKind, Entity, FieldSpec, FieldValue, Materialize};
use crate::user::TwitterUser;

/// Represents a single direct message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectMessage {
    /// Numeric ID for this DM.
    pub id: Option<u64>,
    /// The ID of the user who sent the DM.
    pub sender_id: Option<u64>,
    /// The ID of the user who received the DM.
    pub recipient_id: Option<u64>,
    /// The text of the DM.
    pub text: Option<String>,
    /// Timestamp showing when this DM was created. Kept opaque.
    pub created_at: Option<String>,
    /// The screen name of the user who sent the DM.
    pub sender_screen_name: Option<String>,
    /// The screen name of the user who received the DM.
    pub recipient_screen_name: Option<String>,
    /// The full profile of the user who sent the DM.
    pub sender: Option<Box<TwitterUser>>,
    /// The full profile of the user who received the DM.
    pub recipient: Option<Box<TwitterUser>>,
}

impl Materialize for DirectMessage {
    const KIND: EntityKind = EntityKind::DirectMessage;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::number("id"),
        FieldSpec::number("sender_id"),
        FieldSpec::number("recipient_id"),
        FieldSpec::text("text"),
        FieldSpec::text("created_at"),
        FieldSpec::text("sender_screen_name"),
        FieldSpec::text("recipient_screen_name"),
        FieldSpec::nested("sender", EntityKind::User),
        FieldSpec::nested("recipient", EntityKind::User),
    ];

    fn assign(&mut self, name: &str, value: FieldValue) {
        match (name, value) {
            ("id", FieldValue::Number(n)) => self.id = Some(n),
            ("sender_id", FieldValue::Number(n)) => self.sender_id = Some(n),
            ("recipient_id", FieldValue::Number(n)) => self.recipient_id = Some(n),
            ("text", FieldValue::Text(s)) => self.text = Some(s),
            ("created_at", FieldValue::Text(s)) => self.created_at = Some(s),
            ("sender_screen_name", FieldValue::Text(s)) => self.sender_screen_name = Some(s),
            ("recipient_screen_name", FieldValue::Text(s)) => self.recipient_screen_name = Some(s),
            ("sender", FieldValue::Nested(Entity::User(user))) => self.sender = Some(user),
            ("recipient", FieldValue::Nested(Entity::User(user))) => self.recipient = Some(user),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use crate::entity::{DirectMessageCollection, Materializer};
    use crate::wire::node_from_json;

    #[test]
    fn parse_inbox() {
        let sample_str = {
            use std::io::Read;
            let mut file = std::fs::File::open("src/direct/sample-direct-messages.json").unwrap();
            let mut ret = String::new();
            file.read_to_string(&mut ret).unwrap();
            ret
        };
        let json = serde_json::from_str(&sample_str).unwrap();
        let node = node_from_json("direct_messages", &json).unwrap();
        let entity = Materializer::new().materialize(&node).unwrap();
        let messages = DirectMessageCollection::try_from(entity).unwrap();

        assert_eq!(messages.len(), 2);

        let first = messages.at(0).unwrap();
        assert_eq!(first.id, Some(331681));
        assert_eq!(first.text.as_deref(), Some("thanks for the invite!"));
        assert_eq!(first.sender_screen_name.as_deref(), Some("leah"));
        assert_eq!(
            first.sender.as_ref().unwrap().screen_name.as_deref(),
            Some("leah")
        );
        assert_eq!(
            first.recipient.as_ref().unwrap().screen_name.as_deref(),
            Some("room208")
        );

        let second = messages.at(1).unwrap();
        assert_eq!(second.id, Some(331682));
        assert_eq!(second.sender_screen_name.as_deref(), Some("room208"));
    }
}
