//! Repository traits and supporting query types.
//!
//! Storage backends (e.g. `lezo-store-sqlite`, or [`crate::memory`] in tests)
//! implement these traits. The inference engine, the import pipeline and the
//! HTTP layer depend only on this abstraction.

use std::future::Future;

use uuid::Uuid;

use crate::{
  citizen::{Citizen, CitizenPatch, CitizenStatus, DedupKey, Identifier, NewCitizen},
  region::Region,
  relationship::{NewRelationship, Relationship},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend error types expose the domain error they wrap, if any, so callers
/// can tell "not found" or "duplicate" apart from an I/O failure without
/// knowing which backend they talk to.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

impl StoreError for crate::Error {
  fn as_core(&self) -> Option<&crate::Error> { Some(self) }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`CitizenRepository::list_citizens`].
#[derive(Debug, Clone, Default)]
pub struct CitizenQuery {
  pub region: Option<Region>,
  pub status: Option<CitizenStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Outcome of a [`CitizenRepository::bulk_insert`].
#[derive(Debug, Default)]
pub struct BulkInsert {
  pub created:  Vec<Citizen>,
  /// Rows refused by a storage constraint: `(index into the input, reason)`.
  pub rejected: Vec<(usize, String)>,
}

// ─── Citizens ────────────────────────────────────────────────────────────────

/// Read and write access to citizen records.
///
/// Records are never deleted; [`set_status`](Self::set_status) and
/// [`bulk_update`](Self::bulk_update) are the only mutations.
pub trait CitizenRepository: Send + Sync {
  type Error: StoreError;

  /// Persist a single manually-entered citizen. Fails with
  /// [`crate::Error::DuplicateCitizen`] if the dedup key is taken.
  fn add_citizen(
    &self,
    input: NewCitizen,
  ) -> impl Future<Output = Result<Citizen, Self::Error>> + Send + '_;

  fn get_citizen(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + '_;

  /// Fetch several citizens at once. Unknown ids are silently omitted.
  fn get_citizens(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Citizen>, Self::Error>> + Send + '_;

  fn list_citizens<'a>(
    &'a self,
    query: &'a CitizenQuery,
  ) -> impl Future<Output = Result<Vec<Citizen>, Self::Error>> + Send + 'a;

  /// Look for an existing citizen matching `key`.
  ///
  /// - [`DedupKey::NameBirthday`]: same names and birthday, any region.
  /// - [`DedupKey::NameRegion`]: same names in the same region, whatever the
  ///   stored birthday.
  fn find_duplicate<'a>(
    &'a self,
    key: &'a DedupKey,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + 'a;

  /// Match by TIN first, then by PhilHealth number.
  fn find_by_identifier<'a>(
    &'a self,
    identifier: &'a Identifier,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + 'a;

  /// Insert many citizens in a single transaction. Rows that clash with a
  /// uniqueness constraint are reported in [`BulkInsert::rejected`] and do
  /// not abort the others.
  fn bulk_insert(
    &self,
    rows: Vec<NewCitizen>,
  ) -> impl Future<Output = Result<BulkInsert, Self::Error>> + Send + '_;

  /// Apply many patches in a single transaction; returns how many citizens
  /// were changed.
  fn bulk_update(
    &self,
    patches: Vec<(Uuid, CitizenPatch)>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Soft lifecycle change. Fails with [`crate::Error::CitizenNotFound`].
  fn set_status(
    &self,
    id: Uuid,
    status: CitizenStatus,
  ) -> impl Future<Output = Result<Citizen, Self::Error>> + Send + '_;
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// Kin edges between citizens. Create and read only.
///
/// Backends must index both endpoints so that every lookup here is
/// proportional to a citizen's degree, not to the size of the registry.
pub trait RelationshipRepository: CitizenRepository {
  /// Record a new edge.
  ///
  /// Fails with [`crate::Error::SelfRelationship`],
  /// [`crate::Error::CitizenNotFound`] or
  /// [`crate::Error::DuplicateRelationship`].
  fn add_relationship(
    &self,
    input: NewRelationship,
  ) -> impl Future<Output = Result<Relationship, Self::Error>> + Send + '_;

  fn relationship_exists(
    &self,
    edge: NewRelationship,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Edges whose source is `citizen_id`.
  fn edges_from(
    &self,
    citizen_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  /// Edges whose target is `citizen_id`.
  fn edges_to(
    &self,
    citizen_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  /// Edges touching `citizen_id` at either end, ordered by recording time.
  fn edges_of(
    &self,
    citizen_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;
}
