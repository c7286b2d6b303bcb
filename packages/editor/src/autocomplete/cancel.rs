//! Provider work that stops when its menu session or query goes away

use super::controller::TaskOutcome;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Drive `work` until it finishes or `token` fires. A fired token always
/// wins, even when `work` is ready in the same poll.
pub(crate) async fn run_until_cancelled<F, T>(token: &CancellationToken, work: F, finish: T) -> TaskOutcome
where
    F: Future,
    T: FnOnce(F::Output) -> TaskOutcome,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => TaskOutcome::Cancelled,
        output = work => finish(output),
    }
}
