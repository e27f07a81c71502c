//! Sequential execution of deferred operations.
//!
//! Each operation is a zero-argument closure producing a future. Nothing is
//! started until its predecessor has settled, and results come back in input
//! order. The first failure stops the run; operations that already completed
//! keep their side effects.

use std::future::Future;
use tracing::trace;

/// Run `ops` strictly one after another.
///
/// Returns every result in input order, or the first error. Operations after
/// a failing one are never invoked.
pub async fn run_in_order<I, F, Fut, T, E>(ops: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let ops = ops.into_iter();
    let mut out = Vec::with_capacity(ops.size_hint().0);

    for (index, op) in ops.enumerate() {
        trace!(index, "running deferred operation");
        out.push(op().await?);
    }

    Ok(out)
}
