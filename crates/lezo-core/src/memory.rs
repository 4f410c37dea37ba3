//! In-memory repository used by tests and examples.
//!
//! Mirrors the constraints of the SQLite backend: the dedup keys are unique,
//! kin edges are unique per `(source, target, kind)` and may not loop.

use std::{
  collections::HashSet,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  citizen::{Citizen, CitizenPatch, CitizenStatus, DedupKey, Identifier, NewCitizen},
  region::Region,
  relationship::{NewRelationship, Relationship},
  store::{BulkInsert, CitizenQuery, CitizenRepository, RelationshipRepository},
};

#[derive(Default)]
struct Inner {
  citizens:      Vec<Citizen>,
  relationships: Vec<Relationship>,
  failing:       HashSet<Region>,
}

impl Inner {
  fn citizen(&self, id: Uuid) -> Option<&Citizen> {
    self.citizens.iter().find(|c| c.citizen_id == id)
  }

  /// Would `key` violate a uniqueness constraint of the stored citizens?
  fn key_taken(&self, key: &DedupKey) -> bool {
    self.citizens.iter().any(|c| match (key, c.birthday) {
      (DedupKey::NameBirthday { .. }, Some(_)) | (DedupKey::NameRegion { .. }, None) => {
        c.dedup_key() == *key
      }
      _ => false,
    })
  }
}

/// A [`CitizenRepository`] + [`RelationshipRepository`] held in a mutex.
#[derive(Default)]
pub struct InMemoryRegistry {
  inner: Mutex<Inner>,
}

impl InMemoryRegistry {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent bulk insert containing a row of `region` fail as
  /// a whole, the way a dropped connection would.
  pub fn fail_bulk_inserts_for(&self, region: Region) {
    self.lock().failing.insert(region);
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CitizenRepository for InMemoryRegistry {
  type Error = Error;

  async fn add_citizen(&self, input: NewCitizen) -> Result<Citizen> {
    let mut inner = self.lock();
    let key = input.dedup_key();
    if inner.key_taken(&key) {
      return Err(Error::DuplicateCitizen(key));
    }
    let citizen = input.into_citizen(Uuid::new_v4(), Utc::now());
    inner.citizens.push(citizen.clone());
    Ok(citizen)
  }

  async fn get_citizen(&self, id: Uuid) -> Result<Option<Citizen>> {
    Ok(self.lock().citizen(id).cloned())
  }

  async fn get_citizens(&self, ids: Vec<Uuid>) -> Result<Vec<Citizen>> {
    let inner = self.lock();
    Ok(ids.into_iter().filter_map(|id| inner.citizen(id).cloned()).collect())
  }

  async fn list_citizens(&self, query: &CitizenQuery) -> Result<Vec<Citizen>> {
    let inner = self.lock();
    Ok(
      inner
        .citizens
        .iter()
        .filter(|c| query.region.is_none_or(|r| c.region == r))
        .filter(|c| query.status.is_none_or(|s| c.status == s))
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(100))
        .cloned()
        .collect(),
    )
  }

  async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Citizen>> {
    let inner = self.lock();
    let found = inner.citizens.iter().find(|c| match key {
      DedupKey::NameBirthday { last_name, first_name, birthday } => {
        c.last_name == *last_name && c.first_name == *first_name && c.birthday == Some(*birthday)
      }
      DedupKey::NameRegion { last_name, first_name, region } => {
        c.last_name == *last_name && c.first_name == *first_name && c.region == *region
      }
    });
    Ok(found.cloned())
  }

  async fn find_by_identifier(&self, identifier: &Identifier) -> Result<Option<Citizen>> {
    let inner = self.lock();
    let by_tin = identifier
      .tin
      .as_ref()
      .and_then(|tin| inner.citizens.iter().find(|c| c.tin.as_ref() == Some(tin)));
    let found = by_tin.or_else(|| {
      identifier.philhealth_no.as_ref().and_then(|no| {
        inner.citizens.iter().find(|c| c.philhealth_no.as_ref() == Some(no))
      })
    });
    Ok(found.cloned())
  }

  async fn bulk_insert(&self, rows: Vec<NewCitizen>) -> Result<BulkInsert> {
    let mut inner = self.lock();
    if let Some(row) = rows.iter().find(|r| inner.failing.contains(&r.region)) {
      return Err(Error::Unavailable(format!("bulk insert into {} refused", row.region)));
    }

    let mut outcome = BulkInsert::default();
    let now = Utc::now();
    for (index, row) in rows.into_iter().enumerate() {
      let key = row.dedup_key();
      if inner.key_taken(&key) {
        outcome.rejected.push((index, Error::DuplicateCitizen(key).to_string()));
        continue;
      }
      let citizen = row.into_citizen(Uuid::new_v4(), now);
      inner.citizens.push(citizen.clone());
      outcome.created.push(citizen);
    }
    Ok(outcome)
  }

  async fn bulk_update(&self, patches: Vec<(Uuid, CitizenPatch)>) -> Result<usize> {
    let mut inner = self.lock();
    let mut changed = 0;
    for (id, patch) in patches {
      if let Some(citizen) = inner.citizens.iter_mut().find(|c| c.citizen_id == id) {
        patch.apply(citizen);
        changed += 1;
      }
    }
    Ok(changed)
  }

  async fn set_status(&self, id: Uuid, status: CitizenStatus) -> Result<Citizen> {
    let mut inner = self.lock();
    let citizen = inner
      .citizens
      .iter_mut()
      .find(|c| c.citizen_id == id)
      .ok_or(Error::CitizenNotFound(id))?;
    citizen.status = status;
    Ok(citizen.clone())
  }
}

impl RelationshipRepository for InMemoryRegistry {
  async fn add_relationship(&self, input: NewRelationship) -> Result<Relationship> {
    let NewRelationship { source_id, target_id, kind } = input;
    if source_id == target_id {
      return Err(Error::SelfRelationship(source_id));
    }

    let mut inner = self.lock();
    for id in [source_id, target_id] {
      if inner.citizen(id).is_none() {
        return Err(Error::CitizenNotFound(id));
      }
    }
    let exists = inner
      .relationships
      .iter()
      .any(|r| r.source_id == source_id && r.target_id == target_id && r.kind == kind);
    if exists {
      return Err(Error::DuplicateRelationship { source_id, target_id, kind });
    }

    let relationship = Relationship {
      relationship_id: Uuid::new_v4(),
      source_id,
      target_id,
      kind,
      recorded_at: Utc::now(),
    };
    inner.relationships.push(relationship.clone());
    Ok(relationship)
  }

  async fn relationship_exists(&self, edge: NewRelationship) -> Result<bool> {
    Ok(self.lock().relationships.iter().any(|r| {
      r.source_id == edge.source_id && r.target_id == edge.target_id && r.kind == edge.kind
    }))
  }

  async fn edges_from(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    let inner = self.lock();
    Ok(inner.relationships.iter().filter(|r| r.source_id == citizen_id).cloned().collect())
  }

  async fn edges_to(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    let inner = self.lock();
    Ok(inner.relationships.iter().filter(|r| r.target_id == citizen_id).cloned().collect())
  }

  async fn edges_of(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    let inner = self.lock();
    Ok(
      inner
        .relationships
        .iter()
        .filter(|r| r.source_id == citizen_id || r.target_id == citizen_id)
        .cloned()
        .collect(),
    )
  }
}
