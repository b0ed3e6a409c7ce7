// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A composite error type for errors that can occur while interacting with Twitter.

use crate::entity::EntityKind;

/// A convenient alias to a Result containing a local error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A set of errors that can occur when interacting with Twitter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A wire tag had no mapping in the entity type registry. Carries the
    /// offending tag.
    #[error("Type \"{0}\" is not supported")]
    UnsupportedType(String),
    /// A wire field is not part of the target entity's schema. Malformed or
    /// future API responses surface here instead of silently corrupting the
    /// entity.
    #[error("Unknown field \"{field}\" for entity \"{kind}\"")]
    UnknownField {
        /// The field name found on the wire.
        field: String,
        /// The entity kind being materialized.
        kind: EntityKind,
    },
    /// A numeric-typed field carried a value that does not parse as a decimal
    /// integer.
    #[error("Malformed value \"{value}\" for field \"{field}\"")]
    MalformedField {
        /// The schema name of the field.
        field: &'static str,
        /// The raw wire value.
        value: String,
    },
    /// Out-of-bounds access into an entity collection.
    #[error("Index {index} out of bounds for collection of length {len}")]
    Index {
        /// The requested index.
        index: usize,
        /// The length of the collection.
        len: usize,
    },
    /// A required value was missing from the response. Contains the name of
    /// the missing value.
    #[error("Value missing from response: {0}")]
    MissingValue(&'static str),
    /// The response from Twitter was formatted incorrectly or in an
    /// unexpected manner. The enclosed values are an explanatory string and,
    /// if applicable, the offending piece of the response.
    #[error("Invalid response received: {0} ({1:?})")]
    InvalidResponse(&'static str, Option<String>),
    /// The API returned an error message instead of a payload.
    #[error("Error returned by the Twitter API: {0}")]
    Api(String),
    /// The response from Twitter gave a response code that indicated an
    /// error. The enclosed value was the response code.
    #[error("Error status received: {0}")]
    BadStatus(hyper::StatusCode),
    /// An authenticated call was issued without a username or password set.
    #[error("No username or password was set")]
    MissingCredentials,
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    TimedOut,
    /// An invalid input was given to a bot operation. Contains an
    /// explanatory message.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The farm configuration was missing or inconsistent. Contains an
    /// explanatory message.
    #[error("Bad configuration: {0}")]
    Config(String),
    /// The base URL could not be parsed.
    #[error("URL given did not parse: {0}")]
    BadUrl(#[from] url::ParseError),
    /// The web request experienced an error. The enclosed error was returned
    /// from hyper.
    #[error("Network error: {0}")]
    NetError(#[from] hyper::Error),
    /// The HTTP request could not be constructed. The enclosed error was
    /// returned from the http crate.
    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::http::Error),
    /// An error was experienced while parsing a JSON response.
    #[error("JSON deserialize error: {0}")]
    DeserializeError(#[from] serde_json::Error),
    /// An error was experienced while reading or writing YAML configuration.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    /// An IO error was experienced. The enclosed error was returned from the
    /// standard library.
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}
