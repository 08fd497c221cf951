//! DB operation executor logic.
//!
//! This manages the indirection to spawn async requests onto a threadpool and execute blocking
//! calls locally.

use std::sync::Arc;

use oru_db::{errors::DbError, DbResult};
use threadpool::ThreadPool;
use tokio::sync::oneshot;
use tracing::*;

/// Shim to opaquely execute the operation without being aware of the underlying impl.
pub(crate) struct OpShim<T, R> {
    executor_fn: Arc<dyn Fn(T) -> DbResult<R> + Sync + Send + 'static>,
}

impl<T, R> OpShim<T, R>
where
    T: Sync + Send + 'static,
    R: Sync + Send + 'static,
{
    pub(crate) fn wrap<F>(op: F) -> Self
    where
        F: Fn(T) -> DbResult<R> + Sync + Send + 'static,
    {
        Self {
            executor_fn: Arc::new(op),
        }
    }

    /// Executes the operation on the provided thread pool and returns the result over.
    pub(crate) async fn exec_async(&self, pool: &ThreadPool, arg: T) -> DbResult<R> {
        let (resp_tx, resp_rx) = oneshot::channel();

        let exec_fn = self.executor_fn.clone();

        pool.execute(move || {
            let res = exec_fn(arg);
            if resp_tx.send(res).is_err() {
                warn!("failed to send response");
            }
        });

        match resp_rx.await {
            Ok(v) => v,
            Err(e) => Err(DbError::Other(format!("{e}"))),
        }
    }

    /// Executes the operation directly.
    pub(crate) fn exec_blocking(&self, arg: T) -> DbResult<R> {
        (self.executor_fn)(arg)
    }
}

/// Declares an ops struct with an `_async` and a `_blocking` method per
/// operation. Each operation is implemented by a free function of the same
/// name taking the context first.
macro_rules! inst_ops {
    {
        ($base:ident, $ctx:ident $(<$($tparam:ident: $tpconstr:tt),+>)?) {
            $($iname:ident($($aname:ident: $aty:ty),*) => $ret:ty;)*
        }
    } => {
        pub struct $base {
            pool: ThreadPool,
            $($iname: OpShim<($($aty,)*), $ret>,)*
        }

        paste::paste! {
            impl $base {
                pub fn new $(<$($tparam: $tpconstr + Sync + Send + 'static),+>)? (pool: ThreadPool, ctx: Arc<$ctx $(<$($tparam),+>)?>) -> Self {
                    Self {
                        pool,
                        $(
                            $iname: {
                                let ctx = ctx.clone();
                                OpShim::wrap(move |($($aname,)*): ($($aty,)*)| {
                                    $iname(ctx.as_ref(), $($aname),*)
                                })
                            },
                        )*
                    }
                }

                $(
                    pub async fn [<$iname _async>](&self, $($aname: $aty),*) -> DbResult<$ret> {
                        self.$iname.exec_async(&self.pool, ($($aname,)*)).await
                    }

                    pub fn [<$iname _blocking>](&self, $($aname: $aty),*) -> DbResult<$ret> {
                        self.$iname.exec_blocking(($($aname,)*))
                    }
                )*
            }
        }
    }
}

pub(crate) use inst_ops;
