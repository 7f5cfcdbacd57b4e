use std::collections::HashSet;

use itertools::Itertools;
use log::debug;
use rand::seq::index;
use rand::Rng;

use crate::comment::EligibleEntry;
use crate::error::DrawError;

fn dedup_by_author<'a>(entries: impl Iterator<Item = &'a EligibleEntry>) -> Vec<&'a EligibleEntry> {
    entries.unique_by(|e| e.author.as_str()).collect()
}

/// Samples `amount` distinct entries. `index::sample` returns indices in random order, and that
/// order becomes the prize rank.
fn sample<R: Rng + ?Sized>(candidates: &[&EligibleEntry], amount: usize, rng: &mut R) -> Vec<EligibleEntry> {
    index::sample(rng, candidates.len(), amount).into_iter().map(|i| candidates[i].clone()).collect()
}

/// Uniform draw without replacement of `min(count, pool.len())` entries.
///
/// The pool is re-deduplicated by author first, so a caller passing two entries for the same
/// person still cannot hand them two slots. A short pool is returned in full (shuffled) rather
/// than treated as an error.
pub fn select_winners<R: Rng + ?Sized>(pool: &[EligibleEntry], count: usize, rng: &mut R) -> Vec<EligibleEntry> {
    let candidates = dedup_by_author(pool.iter());
    let amount = count.min(candidates.len());
    debug!("drawing {amount} of {} candidates (requested {count})", candidates.len());
    sample(&candidates, amount, rng)
}

/// Draws exactly `count` entries from authors in `allowed`.
///
/// Unlike [`select_winners`] a short pool is an error, since the operator asked for a constrained
/// draw and needs to know it cannot be satisfied.
pub fn select_winners_from_allowlist<R: Rng + ?Sized>(
    pool: &[EligibleEntry],
    allowed: &HashSet<String>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<EligibleEntry>, DrawError> {
    if allowed.iter().any(|id| id.trim().is_empty()) {
        return Err(DrawError::invalid("allow-list contains a blank author id"));
    }
    let candidates = dedup_by_author(pool.iter().filter(|e| allowed.contains(&e.author)));
    if candidates.len() < count {
        return Err(DrawError::InsufficientPool { required: count, available: candidates.len() });
    }
    debug!("drawing {count} of {} allow-listed candidates", candidates.len());
    Ok(sample(&candidates, count, rng))
}
