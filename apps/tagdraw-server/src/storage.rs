use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::info;
use tagdraw::Comment;

use crate::config::{ServerConfig, StoreKind};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("internal error")]
    Internal,
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("record encoding error: {0}")]
    Encoding(#[from] std::io::Error),
}

pub type Store = Arc<dyn CommentStore + Send + Sync + 'static>;

/// Comments keyed by id. `find_all` returns them in first-insertion order, which is the order
/// author deduplication relies on.
pub trait CommentStore {
    /// Inserts a new comment or refreshes author/text/timestamp of a known one. The stored
    /// `verified` flag is never overwritten. Returns whether the comment was new.
    fn upsert(&self, comment: Comment) -> Result<bool, StoreError>;
    fn find_all(&self) -> Result<Vec<Comment>, StoreError>;
    fn get(&self, id: &str) -> Result<Option<Comment>, StoreError>;
    /// `None` when the id is unknown.
    fn set_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>, StoreError>;
    fn stats(&self) -> Result<StoreStats, StoreError>;
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreStats {
    pub comments: usize,
    pub verified: usize,
}

fn refresh(existing: &mut Comment, incoming: Comment) {
    existing.author = incoming.author;
    existing.text = incoming.text;
    existing.timestamp = incoming.timestamp.or(existing.timestamp);
}

#[derive(Default)]
struct MemInner {
    order: Vec<String>,
    rows: HashMap<String, Comment>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

impl CommentStore for MemStore {
    fn upsert(&self, comment: Comment) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Internal)?;
        if let Some(existing) = inner.rows.get_mut(&comment.id) {
            refresh(existing, comment);
            return Ok(false);
        }
        inner.order.push(comment.id.clone());
        inner.rows.insert(comment.id.clone(), comment);
        Ok(true)
    }

    fn find_all(&self) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Internal)?;
        Ok(inner.order.iter().filter_map(|id| inner.rows.get(id).cloned()).collect())
    }

    fn get(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        Ok(self.inner.lock().map_err(|_| StoreError::Internal)?.rows.get(id).cloned())
    }

    fn set_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>, StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Internal)?;
        Ok(inner.rows.get_mut(id).map(|c| {
            c.verified = verified;
            c.clone()
        }))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Internal)?;
        Ok(StoreStats { comments: inner.rows.len(), verified: inner.rows.values().filter(|c| c.verified).count() })
    }
}

// ================= sled backend =================
//
// `comments`: big-endian insertion sequence -> borsh(Comment), so iteration follows arrival.
// `comment_ids`: comment id -> sequence key.

pub struct SledStore {
    db: sled::Db,
    comments: sled::Tree,
    ids: sled::Tree,
    /// Held across every load-modify-put so a sync upsert cannot write back a stale `verified`.
    writes: Mutex<()>,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let comments = db.open_tree("comments")?;
        let ids = db.open_tree("comment_ids")?;
        Ok(Self { db, comments, ids, writes: Mutex::new(()) })
    }

    fn load(&self, seq: &[u8]) -> Result<Option<Comment>, StoreError> {
        match self.comments.get(seq)? {
            Some(bytes) => Ok(Some(borsh::from_slice::<Comment>(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, seq: &[u8], comment: &Comment) -> Result<(), StoreError> {
        self.comments.insert(seq, borsh::to_vec(comment)?)?;
        Ok(())
    }
}

impl CommentStore for SledStore {
    fn upsert(&self, comment: Comment) -> Result<bool, StoreError> {
        let _guard = self.writes.lock().map_err(|_| StoreError::Internal)?;
        if let Some(seq) = self.ids.get(comment.id.as_bytes())? {
            if let Some(mut existing) = self.load(&seq)? {
                refresh(&mut existing, comment);
                self.put(&seq, &existing)?;
                return Ok(false);
            }
        }
        let seq = self.db.generate_id()?.to_be_bytes();
        self.put(&seq, &comment)?;
        self.ids.insert(comment.id.as_bytes(), seq.to_vec())?;
        Ok(true)
    }

    fn find_all(&self) -> Result<Vec<Comment>, StoreError> {
        self.comments.iter().values().map(|v| -> Result<Comment, StoreError> { Ok(borsh::from_slice(&v?)?) }).collect()
    }

    fn get(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        match self.ids.get(id.as_bytes())? {
            Some(seq) => self.load(&seq),
            None => Ok(None),
        }
    }

    fn set_verified(&self, id: &str, verified: bool) -> Result<Option<Comment>, StoreError> {
        let _guard = self.writes.lock().map_err(|_| StoreError::Internal)?;
        let Some(seq) = self.ids.get(id.as_bytes())? else { return Ok(None) };
        let Some(mut comment) = self.load(&seq)? else { return Ok(None) };
        comment.verified = verified;
        self.put(&seq, &comment)?;
        self.db.flush()?;
        Ok(Some(comment))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let all = self.find_all()?;
        Ok(StoreStats { comments: all.len(), verified: all.iter().filter(|c| c.verified).count() })
    }
}

pub fn new_store(cfg: &ServerConfig) -> Result<Store, StoreError> {
    match cfg.store {
        StoreKind::Memory => {
            info!("using in-memory comment store");
            Ok(Arc::new(MemStore::default()))
        }
        StoreKind::Sled => {
            info!("using sled comment store at {}", cfg.db_path.display());
            Ok(Arc::new(SledStore::open(&cfg.db_path)?))
        }
    }
}
