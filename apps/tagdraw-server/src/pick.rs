use log::warn;
use rand::Rng;
use tagdraw::{assign_prizes, eligible_pool, select_winners, DrawError, PrizeTier, TagFilter};

use crate::render::{render_text, winner_rows, WinnerRow};
use crate::storage::{CommentStore, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum PickError {
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One-off draw over the stored comments. Does not touch the server's winner set.
pub fn pick<R: Rng + ?Sized>(
    store: &dyn CommentStore,
    tag: &str,
    count: usize,
    tiers: &[PrizeTier],
    rng: &mut R,
) -> Result<Vec<WinnerRow>, PickError> {
    let filter: TagFilter = tag.parse()?;
    let pool = eligible_pool(&store.find_all()?, filter);
    if pool.len() < count {
        warn!("only {} eligible entries for {count} requested winners", pool.len());
    }
    let winners = select_winners(&pool, count, rng);
    Ok(winner_rows(assign_prizes(&winners, tiers)))
}

pub fn format_rows(rows: &[WinnerRow], as_json: bool) -> Result<String, PickError> {
    if as_json {
        Ok(serde_json::to_string_pretty(rows)?)
    } else if rows.is_empty() {
        Ok("no eligible entries\n".to_string())
    } else {
        Ok(render_text(rows))
    }
}
