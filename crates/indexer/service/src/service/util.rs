//! Utilities for the indexer service, internal to the crate.

/// Spawns a set of actors in a [JoinSet] and waits for all of them. The first actor to fail
/// cancels the others, and its error is returned once every actor has stopped. Error types are
/// erased to strings so actors need not share one.
///
/// [JoinSet]: tokio::task::JoinSet
macro_rules! spawn_and_wait {
    ($cancellation:expr, actors = [$($actor:expr),* $(,)?]) => {{
        let mut tasks = tokio::task::JoinSet::new();
        $(
            let actor = $actor;
            tasks.spawn(async move { actor.start().await.map_err(|err| err.to_string()) });
        )*

        let mut outcome: Result<(), String> = Ok(());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|err| format!("actor task failed: {err}")).and_then(|r| r);
            if let Err(err) = result {
                tracing::error!(target: "indexer", %err, "Actor stopped with an error");
                $cancellation.cancel();
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }};
}

pub(crate) use spawn_and_wait;
