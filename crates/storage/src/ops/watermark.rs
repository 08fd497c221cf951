//! Operations for the aggregator's delivery watermark.
//!
//! The watermark is stored as a fixed-width 8-byte big-endian integer.

use std::sync::Arc;

use oru_db::{errors::DbError, traits::KeyValueStore, types::StoreKey, DbResult};
use threadpool::ThreadPool;

use crate::exec::*;

/// Watermark used when nothing has been persisted yet.
pub const INITIAL_WATERMARK: u64 = 1;

/// Database context for an database operation interface.
pub struct Context<D: KeyValueStore + Sync + Send + 'static> {
    db: Arc<D>,
}

impl<D: KeyValueStore + Sync + Send + 'static> Context<D> {
    /// Create a `Context` for [`WatermarkOps`]
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    /// Convert to [`WatermarkOps`] using a [`ThreadPool`]
    pub fn into_ops(self, pool: ThreadPool) -> WatermarkOps {
        WatermarkOps::new(pool, Arc::new(self))
    }
}

inst_ops! {
    (WatermarkOps, Context<D: KeyValueStore>) {
        get_watermark() => u64;
        put_watermark(watermark: u64) => ();
    }
}

fn get_watermark<D: KeyValueStore + Sync + Send + 'static>(ctx: &Context<D>) -> DbResult<u64> {
    match ctx.db.get(StoreKey::Watermark)? {
        Some(raw) => decode_watermark(&raw),
        None => Ok(INITIAL_WATERMARK),
    }
}

fn put_watermark<D: KeyValueStore + Sync + Send + 'static>(
    ctx: &Context<D>,
    watermark: u64,
) -> DbResult<()> {
    ctx.db
        .put(StoreKey::Watermark, watermark.to_be_bytes().to_vec())
}

fn decode_watermark(raw: &[u8]) -> DbResult<u64> {
    let buf: [u8; 8] = raw
        .try_into()
        .map_err(|_| DbError::Codec(format!("watermark has {} bytes, expected 8", raw.len())))?;
    Ok(u64::from_be_bytes(buf))
}
