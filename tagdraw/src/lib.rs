//! Core of a hashtag giveaway: decides which comments are eligible, draws winners without
//! replacement and pairs them with prize tiers.
//!
//! Everything in this crate is synchronous and free of I/O. Storage, syncing and HTTP live in
//! `tagdraw-server`.

pub mod comment;
pub mod eligibility;
pub mod error;
pub mod prize;
pub mod selector;
pub mod winners;

pub use comment::{Comment, EligibleEntry};
pub use eligibility::{eligible_pool, is_eligible, tag_stats, tags_in, Tag, TagFilter, TagStats};
pub use error::{parse_count, DrawError};
pub use prize::{assign_prizes, default_tiers, Award, PrizeTier};
pub use selector::{select_winners, select_winners_from_allowlist};
pub use winners::{MemoryWinnerStore, WinnerSet, WinnerStore};
