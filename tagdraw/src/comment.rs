use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A comment as fetched from the upstream post. `id` is unique, `author` is not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    /// Milliseconds since epoch, when upstream provided a parseable one.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub verified: bool,
}

impl Comment {
    pub fn new(id: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), author: author.into(), text: text.into(), timestamp: None, verified: false }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// One qualifying comment per author, derived per request and never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleEntry {
    pub comment_id: String,
    pub author: String,
    pub text: String,
    pub timestamp: Option<i64>,
    pub verified: bool,
}

impl From<&Comment> for EligibleEntry {
    fn from(c: &Comment) -> Self {
        Self {
            comment_id: c.id.clone(),
            author: c.author.clone(),
            text: c.text.clone(),
            timestamp: c.timestamp,
            verified: c.verified,
        }
    }
}
