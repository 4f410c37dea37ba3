//! [`SqliteStore`]: the SQLite implementation of the registry repositories.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use lezo_core::{
  citizen::{Citizen, CitizenPatch, CitizenStatus, DedupKey, Identifier, NewCitizen},
  relationship::{NewRelationship, Relationship},
  store::{BulkInsert, CitizenQuery, CitizenRepository, RelationshipRepository},
};

use crate::{
  Error, Result,
  encode::{
    CITIZEN_COLUMNS, RELATIONSHIP_COLUMNS, RawCitizen, RawRelationship, encode_date, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

const INSERT_CITIZEN: &str = "INSERT INTO citizens (
     citizen_id, created_at, last_name, first_name, middle_name, suffix,
     address, precinct, legend, sex, birthday, place_of_birth,
     civil_status, tin, philhealth_no, email, status, region
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)";

/// Keeps `IN (...)` lists well under SQLite's host parameter limit.
const ID_CHUNK: usize = 500;

/// Current time at the precision the timestamp columns keep.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lezo registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a citizen `SELECT` whose column list is [`CITIZEN_COLUMNS`] and
  /// which returns at most one row.
  async fn citizen_where(
    &self,
    clause: &'static str,
    params: Vec<String>,
  ) -> Result<Option<Citizen>> {
    let raw: Option<RawCitizen> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {CITIZEN_COLUMNS} FROM citizens WHERE {clause} LIMIT 1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), RawCitizen::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCitizen::into_citizen).transpose()
  }

  async fn edges_where(&self, clause: &'static str, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    let id_str = encode_uuid(citizen_id);

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
           WHERE {clause}
           ORDER BY recorded_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawRelationship::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }
}

// ─── CitizenRepository impl ──────────────────────────────────────────────────

impl CitizenRepository for SqliteStore {
  type Error = Error;

  async fn add_citizen(&self, input: NewCitizen) -> Result<Citizen> {
    let key = input.dedup_key();
    let citizen = input.into_citizen(Uuid::new_v4(), now());
    let raw = RawCitizen::from(&citizen);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(INSERT_CITIZEN)?;
        match raw.insert(&mut stmt) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(lezo_core::Error::DuplicateCitizen(key).into());
    }
    Ok(citizen)
  }

  async fn get_citizen(&self, id: Uuid) -> Result<Option<Citizen>> {
    self.citizen_where("citizen_id = ?1", vec![encode_uuid(id)]).await
  }

  async fn get_citizens(&self, ids: Vec<Uuid>) -> Result<Vec<Citizen>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawCitizen> = self
      .conn
      .call(move |conn| {
        let mut rows = Vec::with_capacity(id_strs.len());
        for chunk in id_strs.chunks(ID_CHUNK) {
          let placeholders = vec!["?"; chunk.len()].join(", ");
          let sql =
            format!("SELECT {CITIZEN_COLUMNS} FROM citizens WHERE citizen_id IN ({placeholders})");
          let mut stmt = conn.prepare(&sql)?;
          let found = stmt
            .query_map(rusqlite::params_from_iter(chunk), RawCitizen::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows.extend(found);
        }
        Ok(rows)
      })
      .await?;

    let mut by_id: HashMap<Uuid, Citizen> = raws
      .into_iter()
      .map(|raw| raw.into_citizen().map(|c| (c.citizen_id, c)))
      .collect::<Result<_>>()?;

    // Callers get the order they asked for.
    Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
  }

  async fn list_citizens(&self, query: &CitizenQuery) -> Result<Vec<Citizen>> {
    let region_str = query.region.map(|r| r.to_string());
    let status_str = query.status.map(|s| s.to_string());
    let limit_val = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawCitizen> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CITIZEN_COLUMNS} FROM citizens
           WHERE (?1 IS NULL OR region = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY rowid
           LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![region_str, status_str, limit_val, offset_val],
            RawCitizen::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCitizen::into_citizen).collect()
  }

  async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Citizen>> {
    match key {
      DedupKey::NameBirthday { last_name, first_name, birthday } => {
        self
          .citizen_where(
            "last_name = ?1 AND first_name = ?2 AND birthday = ?3",
            vec![last_name.clone(), first_name.clone(), encode_date(*birthday)],
          )
          .await
      }
      DedupKey::NameRegion { last_name, first_name, region } => {
        self
          .citizen_where(
            "region = ?1 AND last_name = ?2 AND first_name = ?3 ORDER BY rowid",
            vec![region.to_string(), last_name.clone(), first_name.clone()],
          )
          .await
      }
    }
  }

  async fn find_by_identifier(&self, identifier: &Identifier) -> Result<Option<Citizen>> {
    if let Some(tin) = &identifier.tin {
      if let Some(found) = self.citizen_where("tin = ?1", vec![tin.clone()]).await? {
        return Ok(Some(found));
      }
    }
    match &identifier.philhealth_no {
      Some(no) => self.citizen_where("philhealth_no = ?1", vec![no.clone()]).await,
      None => Ok(None),
    }
  }

  async fn bulk_insert(&self, rows: Vec<NewCitizen>) -> Result<BulkInsert> {
    let created_at = now();
    let keys: Vec<DedupKey> = rows.iter().map(NewCitizen::dedup_key).collect();
    let citizens: Vec<Citizen> =
      rows.into_iter().map(|row| row.into_citizen(Uuid::new_v4(), created_at)).collect();
    let raws: Vec<RawCitizen> = citizens.iter().map(RawCitizen::from).collect();

    let rejected: Vec<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut rejected = Vec::new();
        {
          let mut stmt = tx.prepare(INSERT_CITIZEN)?;
          for (index, raw) in raws.iter().enumerate() {
            match raw.insert(&mut stmt) {
              Ok(_) => {}
              Err(e) if is_unique_violation(&e) => rejected.push(index),
              Err(e) => return Err(e.into()),
            }
          }
        }
        tx.commit()?;
        Ok(rejected)
      })
      .await?;

    let mut outcome = BulkInsert::default();
    let mut rejected = rejected.into_iter().peekable();
    for (index, citizen) in citizens.into_iter().enumerate() {
      if rejected.next_if_eq(&index).is_some() {
        let detail = lezo_core::Error::DuplicateCitizen(keys[index].clone()).to_string();
        outcome.rejected.push((index, detail));
      } else {
        outcome.created.push(citizen);
      }
    }
    tracing::debug!(
      created = outcome.created.len(),
      rejected = outcome.rejected.len(),
      "bulk insert committed"
    );
    Ok(outcome)
  }

  async fn bulk_update(&self, patches: Vec<(Uuid, CitizenPatch)>) -> Result<usize> {
    let params: Vec<(String, Option<String>, Option<String>, Option<String>)> = patches
      .into_iter()
      .map(|(id, patch)| {
        (encode_uuid(id), patch.status.map(|s| s.to_string()), patch.address, patch.email)
      })
      .collect();

    let changed: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare(
            "UPDATE citizens SET
               status  = COALESCE(?2, status),
               address = COALESCE(?3, address),
               email   = COALESCE(?4, email)
             WHERE citizen_id = ?1",
          )?;
          for (id, status, address, email) in &params {
            changed += stmt.execute(rusqlite::params![id, status, address, email])?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed)
  }

  async fn set_status(&self, id: Uuid, status: CitizenStatus) -> Result<Citizen> {
    let id_str = encode_uuid(id);
    let status_str = status.to_string();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE citizens SET status = ?2 WHERE citizen_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(lezo_core::Error::CitizenNotFound(id).into());
    }
    self.get_citizen(id).await?.ok_or(Error::Core(lezo_core::Error::CitizenNotFound(id)))
  }
}

// ─── RelationshipRepository impl ─────────────────────────────────────────────

/// What happened to an attempted edge insert, decided inside the connection
/// thread.
enum EdgeInsert {
  Inserted,
  MissingCitizen(Uuid),
  Duplicate,
}

impl RelationshipRepository for SqliteStore {
  async fn add_relationship(&self, input: NewRelationship) -> Result<Relationship> {
    let NewRelationship { source_id, target_id, kind } = input;
    if source_id == target_id {
      return Err(lezo_core::Error::SelfRelationship(source_id).into());
    }

    let relationship = Relationship {
      relationship_id: Uuid::new_v4(),
      source_id,
      target_id,
      kind,
      recorded_at: now(),
    };
    let row = [
      encode_uuid(relationship.relationship_id),
      encode_uuid(source_id),
      encode_uuid(target_id),
      kind.to_string(),
      encode_dt(relationship.recorded_at),
    ];

    let outcome: EdgeInsert = self
      .conn
      .call(move |conn| {
        for (id, id_str) in [(source_id, &row[1]), (target_id, &row[2])] {
          let exists = conn
            .query_row(
              "SELECT 1 FROM citizens WHERE citizen_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !exists {
            return Ok(EdgeInsert::MissingCitizen(id));
          }
        }

        let inserted = conn.execute(
          &format!("INSERT INTO relationships ({RELATIONSHIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params_from_iter(&row),
        );
        match inserted {
          Ok(_) => Ok(EdgeInsert::Inserted),
          Err(e) if is_unique_violation(&e) => Ok(EdgeInsert::Duplicate),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      EdgeInsert::Inserted => {
        tracing::debug!(%source_id, %target_id, %kind, "relationship recorded");
        Ok(relationship)
      }
      EdgeInsert::MissingCitizen(id) => Err(lezo_core::Error::CitizenNotFound(id).into()),
      EdgeInsert::Duplicate => {
        Err(lezo_core::Error::DuplicateRelationship { source_id, target_id, kind }.into())
      }
    }
  }

  async fn relationship_exists(&self, edge: NewRelationship) -> Result<bool> {
    let params = [encode_uuid(edge.source_id), encode_uuid(edge.target_id), edge.kind.to_string()];

    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM relationships
               WHERE source_id = ?1 AND target_id = ?2 AND kind = ?3",
              rusqlite::params_from_iter(&params),
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;

    Ok(exists)
  }

  async fn edges_from(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    self.edges_where("source_id = ?1", citizen_id).await
  }

  async fn edges_to(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    self.edges_where("target_id = ?1", citizen_id).await
  }

  async fn edges_of(&self, citizen_id: Uuid) -> Result<Vec<Relationship>> {
    self.edges_where("source_id = ?1 OR target_id = ?1", citizen_id).await
  }
}
