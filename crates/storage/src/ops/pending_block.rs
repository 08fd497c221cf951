//! Operations for the block builder's unsealed block.

use std::sync::Arc;

use oru_db::{
    traits::KeyValueStore,
    types::{PendingBlockEntry, StoreKey},
    DbResult,
};
use threadpool::ThreadPool;

use crate::exec::*;

pub struct Context<D: KeyValueStore + Sync + Send + 'static> {
    db: Arc<D>,
}

impl<D: KeyValueStore + Sync + Send + 'static> Context<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    pub fn into_ops(self, pool: ThreadPool) -> PendingBlockOps {
        PendingBlockOps::new(pool, Arc::new(self))
    }
}

inst_ops! {
    (PendingBlockOps, Context<D: KeyValueStore>) {
        get_pending_block() => Option<PendingBlockEntry>;
        put_pending_block(entry: PendingBlockEntry) => ();
    }
}

fn get_pending_block<D: KeyValueStore + Sync + Send + 'static>(
    ctx: &Context<D>,
) -> DbResult<Option<PendingBlockEntry>> {
    ctx.db
        .get(StoreKey::PendingBlock)?
        .map(|raw| borsh::from_slice(&raw).map_err(Into::into))
        .transpose()
}

fn put_pending_block<D: KeyValueStore + Sync + Send + 'static>(
    ctx: &Context<D>,
    entry: PendingBlockEntry,
) -> DbResult<()> {
    let raw = borsh::to_vec(&entry)?;
    ctx.db.put(StoreKey::PendingBlock, raw)
}
