//! Snapshot assembly.

use dialectic_core::{
  Entity,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, Topic},
  store::{DebateStore, Repository},
};
use dialectic_snapshot::{Entities, Snapshot};

use crate::{Error, Result};

async fn all<E, S>(store: &S) -> Result<Vec<E>>
where
  E: Entity,
  S: Repository<E>,
{
  store.list().await.map_err(Error::store)
}

pub(crate) async fn collect<S: DebateStore>(store: &S) -> Result<Snapshot> {
  // Catalog entries are seeded identically by every store.
  let fallacies = all::<Fallacy, S>(store)
    .await?
    .into_iter()
    .filter(|f| f.is_custom)
    .collect();

  let entities = Entities {
    topics: all::<Topic, S>(store).await?,
    claims: all::<Claim, S>(store).await?,
    rebuttals: all::<Rebuttal, S>(store).await?,
    evidences: all::<Evidence, S>(store).await?,
    questions: all::<Question, S>(store).await?,
    sources: all::<Source, S>(store).await?,
    tags: all::<Tag, S>(store).await?,
    fallacies,
  };

  tracing::info!(records = entities.len(), "exported snapshot");
  Ok(Snapshot::new(entities))
}
