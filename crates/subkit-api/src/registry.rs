//! [`Registry`]: orchestrates subscriber CRUD and artifact rendering.
//!
//! The registry is the only component that talks to both the store and the
//! generators. It turns store and generator outcomes into the [`Error`]
//! taxonomy the HTTP layer maps onto status codes.

use std::sync::Arc;

use subkit_artifact::ArtifactKind;
use subkit_core::{
  params::ConnectionParams,
  store::SubscriberStore,
  subscriber::{Deletion, Subscriber},
};
use uuid::Uuid;

use crate::error::{Error, Result};

/// The registry service, generic over its storage backend.
pub struct Registry<S> {
  store:  Arc<S>,
  params: Arc<ConnectionParams>,
}

impl<S> Clone for Registry<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      params: Arc::clone(&self.params),
    }
  }
}

impl<S: SubscriberStore> Registry<S> {
  pub fn new(store: Arc<S>, params: ConnectionParams) -> Self {
    Self { store, params: Arc::new(params) }
  }

  pub fn params(&self) -> &ConnectionParams { &self.params }

  /// Create a subscriber labelled `label`.
  pub async fn add_subscriber(&self, label: String) -> Result<Subscriber> {
    let subscriber = self.store.create(label).await.map_err(unavailable)?;
    tracing::info!(id = %subscriber.id, "subscriber added");
    Ok(subscriber)
  }

  /// All live subscribers in insertion order.
  pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
    self.store.list().await.map_err(unavailable)
  }

  pub async fn get_subscriber(&self, id: Uuid) -> Result<Subscriber> {
    self
      .store
      .get(id)
      .await
      .map_err(unavailable)?
      .ok_or_else(|| not_found(id))
  }

  /// Remove a subscriber; its id is invalid everywhere from then on.
  pub async fn delete_subscriber(&self, id: Uuid) -> Result<()> {
    match self.store.delete(id).await.map_err(unavailable)? {
      Deletion::Deleted => {
        tracing::info!(%id, "subscriber deleted");
        Ok(())
      }
      Deletion::NotFound => Err(not_found(id)),
    }
  }

  /// Render the `kind` artifact for subscriber `id`.
  pub async fn get_artifact(&self, kind: ArtifactKind, id: Uuid) -> Result<String> {
    let subscriber = self.get_subscriber(id).await?;
    subkit_artifact::render(kind, &subscriber, &self.params).map_err(|e| {
      tracing::error!(%id, %kind, error = %e, "stored subscriber failed to render");
      Error::InvalidSubscriber(e.to_string())
    })
  }
}

fn not_found(id: Uuid) -> Error { Error::NotFound(format!("subscriber {id} not found")) }

fn unavailable<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tracing::error!(error = %e, "store operation failed");
  Error::StoreUnavailable(Box::new(e))
}
