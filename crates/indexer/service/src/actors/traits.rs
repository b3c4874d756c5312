//! [IndexerActor] trait.

use async_trait::async_trait;
use std::fmt::{Debug, Display};

/// A long running task of the indexer.
///
/// Actors are built with everything they need, including their channels and a child of the
/// service's cancellation token, then consumed by [`IndexerActor::start`]. An actor returns `Ok`
/// once cancelled and an error when it can no longer make progress, which shuts the service
/// down.
#[async_trait]
pub trait IndexerActor: Send + 'static {
    /// The error type for the actor.
    type Error: Debug + Display + Send;

    /// Runs the actor until it is cancelled or fails.
    async fn start(self) -> Result<(), Self::Error>;
}
