//! Kinship inference: second-order relatives derived from kin edges.
//!
//! Only direct edges are stored. Uncles, aunts, nephews and nieces are
//! recomputed from the current edges on every call and never persisted.
//!
//! Edges are read from both ends, so "A is father of B" and "B is son of A"
//! both make A a parent of B:
//!
//! | relation of `c` | derived from |
//! |-----------------|--------------|
//! | parent `p`  | `(p, c, father\|mother)` or `(c, p, son\|daughter)` |
//! | sibling `s` | `(s, c, brother\|sister)` or `(c, s, brother\|sister)` |
//! | child `k`   | `(c, k, father\|mother)` or `(k, c, son\|daughter)` |
//!
//! An uncle or aunt is a sibling of a parent; a nephew or niece is a child of
//! a sibling.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::{
  citizen::{Citizen, Sex},
  relationship::{Relationship, RelationshipKind},
  store::RelationshipRepository,
};

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KinLabel {
  Uncle,
  Aunt,
  Nephew,
  Niece,
}

impl KinLabel {
  fn elder(sex: Option<Sex>) -> Self {
    match sex {
      Some(Sex::Female) => Self::Aunt,
      Some(Sex::Male) | None => Self::Uncle,
    }
  }

  fn junior(sex: Option<Sex>) -> Self {
    match sex {
      Some(Sex::Female) => Self::Niece,
      Some(Sex::Male) | None => Self::Nephew,
    }
  }
}

/// An inferred relative: `citizen` is the `label` of the queried citizen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kin {
  pub label:   KinLabel,
  pub citizen: Citizen,
}

/// Which edge kinds count as siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiblingPolicy {
  /// Both `brother` and `sister` edges.
  #[default]
  AnySibling,
  /// Only `brother` edges; a relative linked through `sister` is not found.
  BrotherOnly,
}

impl SiblingPolicy {
  fn admits(self, kind: RelationshipKind) -> bool {
    match self {
      Self::AnySibling => kind.is_sibling(),
      Self::BrotherOnly => kind == RelationshipKind::Brother,
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Infer uncles/aunts and nephews/nieces of `citizen_id`.
///
/// Uncles and aunts come first, then nephews and nieces; each group is
/// ordered by citizen id. A citizen with no recorded kin, or an unknown id,
/// yields an empty list.
pub async fn infer<S>(store: &S, citizen_id: Uuid) -> Result<Vec<Kin>, S::Error>
where
  S: RelationshipRepository,
{
  infer_with(store, citizen_id, SiblingPolicy::default()).await
}

/// [`infer`] with an explicit [`SiblingPolicy`].
pub async fn infer_with<S>(
  store: &S,
  citizen_id: Uuid,
  policy: SiblingPolicy,
) -> Result<Vec<Kin>, S::Error>
where
  S: RelationshipRepository,
{
  let mut hints = SexHints::default();

  let own_edges = store.edges_of(citizen_id).await?;
  hints.record(&own_edges);
  let own = Neighbourhood::of(citizen_id, &own_edges, policy);

  let mut elders = BTreeSet::new();
  for &parent in &own.parents {
    let edges = store.edges_of(parent).await?;
    hints.record(&edges);
    elders.extend(Neighbourhood::of(parent, &edges, policy).siblings);
  }
  elders.remove(&citizen_id);
  elders.retain(|id| !own.parents.contains(id));

  let mut juniors = BTreeSet::new();
  for &sibling in &own.siblings {
    let edges = store.edges_of(sibling).await?;
    hints.record(&edges);
    juniors.extend(Neighbourhood::of(sibling, &edges, policy).children);
  }
  juniors.remove(&citizen_id);

  tracing::debug!(
    %citizen_id,
    parents = own.parents.len(),
    siblings = own.siblings.len(),
    elders = elders.len(),
    juniors = juniors.len(),
    "inferred kinship"
  );

  if elders.is_empty() && juniors.is_empty() {
    return Ok(Vec::new());
  }

  let ids = elders.iter().chain(juniors.iter()).copied().collect();
  let mut citizens: HashMap<Uuid, Citizen> = store
    .get_citizens(ids)
    .await?
    .into_iter()
    .map(|c| (c.citizen_id, c))
    .collect();

  let mut kin = Vec::with_capacity(elders.len() + juniors.len());
  for id in elders {
    if let Some(citizen) = citizens.get(&id) {
      let label = KinLabel::elder(hints.sex_of(citizen));
      kin.push(Kin { label, citizen: citizen.clone() });
    }
  }
  for id in juniors {
    if let Some(citizen) = citizens.remove(&id) {
      let label = KinLabel::junior(hints.sex_of(&citizen));
      kin.push(Kin { label, citizen });
    }
  }
  Ok(kin)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The direct relatives of one citizen, read off the edges touching them.
#[derive(Debug, Default)]
struct Neighbourhood {
  parents:  BTreeSet<Uuid>,
  siblings: BTreeSet<Uuid>,
  children: BTreeSet<Uuid>,
}

impl Neighbourhood {
  fn of(center: Uuid, edges: &[Relationship], policy: SiblingPolicy) -> Self {
    let mut n = Self::default();
    for edge in edges.iter().filter(|e| e.source_id != e.target_id) {
      let kind = edge.kind;
      // Read the edge from `center`'s side: "other is `kind` of center".
      let (is_parent, is_child) = if edge.target_id == center {
        (kind.is_parent(), kind.is_child())
      } else if edge.source_id == center {
        (kind.is_child(), kind.is_parent())
      } else {
        continue;
      };
      let other = edge.other(center);
      if is_parent {
        n.parents.insert(other);
      } else if is_child {
        n.children.insert(other);
      } else if policy.admits(kind) {
        n.siblings.insert(other);
      }
    }
    n
  }
}

/// Sex implied by the edges a citizen is the source of. The first edge seen
/// wins; the recorded `sex` column is the fallback.
#[derive(Debug, Default)]
struct SexHints(HashMap<Uuid, Sex>);

impl SexHints {
  fn record(&mut self, edges: &[Relationship]) {
    for edge in edges {
      self.0.entry(edge.source_id).or_insert(edge.kind.source_sex());
    }
  }

  fn sex_of(&self, citizen: &Citizen) -> Option<Sex> {
    self.0.get(&citizen.citizen_id).copied().or(citizen.sex)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;
  use crate::{
    citizen::NewCitizen,
    memory::InMemoryRegistry,
    region::Region,
    relationship::NewRelationship,
    store::{CitizenRepository, RelationshipRepository},
  };

  async fn person(store: &InMemoryRegistry, first: &str, sex: Option<Sex>) -> Uuid {
    let mut input = NewCitizen::new("Doe", first, "P1", Region::Poblacion);
    input.sex = sex;
    store.add_citizen(input).await.unwrap().citizen_id
  }

  async fn link(store: &InMemoryRegistry, source_id: Uuid, target_id: Uuid, kind: RelationshipKind) {
    store
      .add_relationship(NewRelationship { source_id, target_id, kind })
      .await
      .unwrap();
  }

  fn labelled(kin: &[Kin]) -> Vec<(KinLabel, Uuid)> {
    kin.iter().map(|k| (k.label, k.citizen.citizen_id)).collect()
  }

  #[tokio::test]
  async fn father_and_brother_give_uncle_and_nephew() {
    let s = InMemoryRegistry::new();
    let a = person(&s, "Alan", None).await;
    let b = person(&s, "Ben", None).await;
    let c = person(&s, "Carl", None).await;
    link(&s, a, b, RelationshipKind::Father).await;
    link(&s, c, a, RelationshipKind::Brother).await;

    let of_b = labelled(&infer(&s, b).await.unwrap());
    assert!(of_b.contains(&(KinLabel::Uncle, c)), "{of_b:?}");

    let of_c = labelled(&infer(&s, c).await.unwrap());
    assert!(of_c.contains(&(KinLabel::Nephew, b)), "{of_c:?}");
  }

  #[tokio::test]
  async fn brother_edge_from_the_parent_side() {
    let s = InMemoryRegistry::new();
    let parent = person(&s, "Pete", Some(Sex::Male)).await;
    let child = person(&s, "Kit", Some(Sex::Female)).await;
    let uncle = person(&s, "Ugo", Some(Sex::Male)).await;
    link(&s, parent, child, RelationshipKind::Father).await;
    link(&s, parent, uncle, RelationshipKind::Brother).await;

    let of_child = labelled(&infer(&s, child).await.unwrap());
    assert_eq!(of_child, vec![(KinLabel::Uncle, uncle)]);

    let of_uncle = labelled(&infer(&s, uncle).await.unwrap());
    assert_eq!(of_uncle, vec![(KinLabel::Niece, child)]);
  }

  #[tokio::test]
  async fn child_edges_count_as_parent_edges() {
    let s = InMemoryRegistry::new();
    let parent = person(&s, "Paul", None).await;
    let child = person(&s, "Sam", None).await;
    let aunt = person(&s, "Ana", None).await;
    link(&s, child, parent, RelationshipKind::Son).await;
    link(&s, aunt, parent, RelationshipKind::Sister).await;

    let kin = labelled(&infer(&s, child).await.unwrap());
    assert_eq!(kin, vec![(KinLabel::Aunt, aunt)]);

    let kin = labelled(&infer(&s, aunt).await.unwrap());
    assert_eq!(kin, vec![(KinLabel::Nephew, child)]);
  }

  #[tokio::test]
  async fn brother_only_policy_ignores_sister_edges() {
    let s = InMemoryRegistry::new();
    let parent = person(&s, "Paul", None).await;
    let child = person(&s, "Sam", None).await;
    let aunt = person(&s, "Ana", None).await;
    link(&s, parent, child, RelationshipKind::Father).await;
    link(&s, aunt, parent, RelationshipKind::Sister).await;

    let kin = infer_with(&s, child, SiblingPolicy::BrotherOnly).await.unwrap();
    assert!(kin.is_empty());
    assert_eq!(infer(&s, child).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn uncle_reached_through_both_parents_appears_once() {
    let s = InMemoryRegistry::new();
    let father = person(&s, "Fred", None).await;
    let mother = person(&s, "Mona", None).await;
    let child = person(&s, "Cody", None).await;
    let uncle = person(&s, "Ulf", None).await;
    link(&s, father, child, RelationshipKind::Father).await;
    link(&s, mother, child, RelationshipKind::Mother).await;
    link(&s, uncle, father, RelationshipKind::Brother).await;
    link(&s, uncle, mother, RelationshipKind::Brother).await;
    link(&s, father, uncle, RelationshipKind::Brother).await;

    let kin = infer(&s, child).await.unwrap();
    let pairs: HashSet<_> = labelled(&kin).into_iter().collect();
    assert_eq!(pairs.len(), kin.len());
    assert_eq!(kin.len(), 1);
  }

  #[tokio::test]
  async fn no_parents_means_no_uncles_and_no_siblings_means_no_nephews() {
    let s = InMemoryRegistry::new();
    let loner = person(&s, "Lone", None).await;
    let son = person(&s, "Sonny", None).await;
    link(&s, loner, son, RelationshipKind::Father).await;

    // A child but no parents and no siblings.
    assert!(infer(&s, loner).await.unwrap().is_empty());
    // A parent with no siblings.
    assert!(infer(&s, son).await.unwrap().is_empty());
    // Unknown citizen.
    assert!(infer(&s, Uuid::new_v4()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn siblings_are_not_their_own_nephews() {
    let s = InMemoryRegistry::new();
    let a = person(&s, "Abe", None).await;
    let b = person(&s, "Bea", None).await;
    let p = person(&s, "Pop", None).await;
    link(&s, p, a, RelationshipKind::Father).await;
    link(&s, p, b, RelationshipKind::Father).await;
    link(&s, a, b, RelationshipKind::Brother).await;

    // b's sibling a has no children; p is a's parent, not a's child.
    assert!(infer(&s, b).await.unwrap().is_empty());
    // a's parent p has no siblings, and b is a's sibling, not an uncle.
    assert!(infer(&s, a).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn results_reflect_edges_added_later() {
    let s = InMemoryRegistry::new();
    let a = person(&s, "Alan", None).await;
    let b = person(&s, "Ben", None).await;
    let c = person(&s, "Carl", None).await;
    link(&s, a, b, RelationshipKind::Father).await;
    assert!(infer(&s, b).await.unwrap().is_empty());

    link(&s, c, a, RelationshipKind::Brother).await;
    assert_eq!(infer(&s, b).await.unwrap().len(), 1);
  }
}
