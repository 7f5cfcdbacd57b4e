//! Hashtag eligibility.
//!
//! A comment qualifies when it carries `#P`, `#S` or `#K`: a literal `#`, optional whitespace,
//! the letter in either case, and then a word boundary. `#participate` therefore does not count
//! as `#p`. The boundary is ASCII-only: a tag directly followed by CJK text still counts.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comment::{Comment, EligibleEntry};
use crate::error::DrawError;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*([pskPSK])").expect("static hashtag pattern"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    P,
    S,
    K,
}

impl Tag {
    fn from_letter(c: char) -> Option<Tag> {
        match c.to_ascii_lowercase() {
            'p' => Some(Tag::P),
            's' => Some(Tag::S),
            'k' => Some(Tag::K),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::P => write!(f, "#P"),
            Tag::S => write!(f, "#S"),
            Tag::K => write!(f, "#K"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Only(Tag),
}

impl TagFilter {
    fn accepts(&self, tags: &[Tag]) -> bool {
        match self {
            TagFilter::All => !tags.is_empty(),
            TagFilter::Only(tag) => tags.contains(tag),
        }
    }
}

impl FromStr for TagFilter {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(TagFilter::All);
        }
        let letter = s.strip_prefix('#').unwrap_or(s);
        let mut chars = letter.chars();
        match (chars.next().and_then(Tag::from_letter), chars.next()) {
            (Some(tag), None) => Ok(TagFilter::Only(tag)),
            _ => Err(DrawError::invalid(format!("unknown tag filter {s:?}, expected all, P, S or K"))),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Distinct tags present in `text`, in P, S, K order.
pub fn tags_in(text: &str) -> Vec<Tag> {
    HASHTAG
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let bounded = text[m.end()..].chars().next().map_or(true, |c| !is_word_char(c));
            if !bounded {
                return None;
            }
            m.as_str().chars().next().and_then(Tag::from_letter)
        })
        .sorted()
        .dedup()
        .collect()
}

pub fn is_eligible(text: &str, filter: TagFilter) -> bool {
    if text.is_empty() {
        return false;
    }
    filter.accepts(&tags_in(text))
}

/// Filters `comments` by `filter` and keeps the first comment seen for each author, in input order.
pub fn eligible_pool(comments: &[Comment], filter: TagFilter) -> Vec<EligibleEntry> {
    comments
        .iter()
        .filter(|c| is_eligible(&c.text, filter))
        .unique_by(|c| c.author.as_str())
        .map(EligibleEntry::from)
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
    pub p: usize,
    pub s: usize,
    pub k: usize,
    pub total: usize,
}

/// Per-tag counts over the deduplicated eligible pool. An entry carrying several tags counts
/// towards each of them, but only once towards `total`.
pub fn tag_stats(comments: &[Comment]) -> TagStats {
    let pool = eligible_pool(comments, TagFilter::All);
    let mut stats = TagStats { total: pool.len(), ..Default::default() };
    for entry in &pool {
        for tag in tags_in(&entry.text) {
            match tag {
                Tag::P => stats.p += 1,
                Tag::S => stats.s += 1,
                Tag::K => stats.k += 1,
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtag_boundary() {
        assert!(!is_eligible("I #participate today", TagFilter::All));
        assert!(is_eligible("go #P team", TagFilter::All));
        assert!(is_eligible("#S #K", TagFilter::All));
        assert!(!is_eligible("no tags here", TagFilter::All));
        assert!(!is_eligible("", TagFilter::All));
    }

    #[test]
    fn whitespace_case_and_punctuation() {
        assert!(is_eligible("#  k", TagFilter::All));
        assert!(is_eligible("love it #s!", TagFilter::All));
        assert!(is_eligible("#p,#s", TagFilter::All));
        assert!(is_eligible("#P好棒", TagFilter::All));
        assert!(!is_eligible("#p1", TagFilter::All));
        assert!(!is_eligible("#s_", TagFilter::All));
        assert!(!is_eligible("P S K", TagFilter::All));
    }

    #[test]
    fn specific_filters() {
        let text = "nice #S and #k";
        assert!(!is_eligible(text, TagFilter::Only(Tag::P)));
        assert!(is_eligible(text, TagFilter::Only(Tag::S)));
        assert!(is_eligible(text, TagFilter::Only(Tag::K)));
        assert!(!is_eligible("#sk", TagFilter::Only(Tag::S)));
    }

    #[test]
    fn tags_are_distinct_and_ordered() {
        assert_eq!(tags_in("#k #P #p # s"), vec![Tag::P, Tag::S, Tag::K]);
        assert!(tags_in("#pk").is_empty());
        // a rejected prefix must not hide a later tag
        assert_eq!(tags_in("#participate #k"), vec![Tag::K]);
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("all".parse::<TagFilter>(), Ok(TagFilter::All));
        assert_eq!("ALL".parse::<TagFilter>(), Ok(TagFilter::All));
        assert_eq!("P".parse::<TagFilter>(), Ok(TagFilter::Only(Tag::P)));
        assert_eq!("s".parse::<TagFilter>(), Ok(TagFilter::Only(Tag::S)));
        assert_eq!("#K".parse::<TagFilter>(), Ok(TagFilter::Only(Tag::K)));
        assert!("x".parse::<TagFilter>().is_err());
        assert!("pk".parse::<TagFilter>().is_err());
        assert!("".parse::<TagFilter>().is_err());
    }

    #[test]
    fn pool_dedups_by_author_first_seen() {
        let comments = vec![
            Comment::new("1", "a", "#P"),
            Comment::new("2", "a", "#S"),
            Comment::new("3", "b", "#K"),
            Comment::new("4", "c", "nothing"),
        ];
        let pool = eligible_pool(&comments, TagFilter::All);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].author, "a");
        assert_eq!(pool[0].comment_id, "1");
        assert_eq!(pool[1].author, "b");
    }

    #[test]
    fn pool_dedup_applies_after_filtering() {
        // a's first comment lacks #S, so the second one is the canonical entry for the S filter
        let comments = vec![Comment::new("1", "a", "#P"), Comment::new("2", "a", "#S")];
        let pool = eligible_pool(&comments, TagFilter::Only(Tag::S));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].comment_id, "2");
    }

    #[test]
    fn stats_over_deduplicated_pool() {
        let comments = vec![
            Comment::new("1", "a", "#P #S"),
            Comment::new("2", "a", "#K"),
            Comment::new("3", "b", "#k"),
            Comment::new("4", "c", "#parade"),
        ];
        assert_eq!(tag_stats(&comments), TagStats { p: 1, s: 1, k: 1, total: 2 });
    }
}
