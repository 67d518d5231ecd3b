use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiblingType {
    #[default]
    Full,
    Paternal,
    Maternal,
    Adoptive,
}

/// A calendar date where month and day may be unknown (stored as `0`).
///
/// Unknown components sort before known ones of the same year, so
/// `1900` < `1900-03` < `1900-03-12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl PartialDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn year(year: i32) -> Self {
        Self::new(year, 0, 0)
    }
}

impl Ord for PartialDate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month, self.day).cmp(&(other.year, other.month, other.day))
    }
}

impl PartialOrd for PartialDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (0, _) => write!(f, "{:04}", self.year),
            (m, 0) => write!(f, "{:04}-{:02}", self.year, m),
            (m, d) => write!(f, "{:04}-{:02}-{:02}", self.year, m, d),
        }
    }
}

/// Sort key that puts missing dates after every known date.
pub fn date_sort_key(date: Option<PartialDate>) -> (bool, PartialDate) {
    match date {
        Some(date) => (false, date),
        None => (true, PartialDate::new(i32::MAX, u8::MAX, u8::MAX)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpouseLink {
    pub id: PersonId,
    pub marriage_date: Option<PartialDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    pub id: PersonId,
    pub co_parent_id: Option<PersonId>,
    pub birth_order: u16,
    pub birth_date: Option<PartialDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingLink {
    pub id: PersonId,
    pub sibling_type: SiblingType,
    pub birth_order: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub gender: Gender,
    pub birth_date: Option<PartialDate>,
    pub death_date: Option<PartialDate>,
    pub is_living: bool,
    pub mother: Option<PersonId>,
    pub father: Option<PersonId>,
    pub spouses: Vec<SpouseLink>,
    pub children: Vec<ChildLink>,
    pub siblings: Vec<SiblingLink>,
}

impl Person {
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: PersonId::new(id),
            gender,
            birth_date: None,
            death_date: None,
            is_living: false,
            mother: None,
            father: None,
            spouses: Vec::new(),
            children: Vec::new(),
            siblings: Vec::new(),
        }
    }

    /// Returns `(father, mother)`.
    pub fn parents(&self) -> (Option<&PersonId>, Option<&PersonId>) {
        (self.father.as_ref(), self.mother.as_ref())
    }
}

/// In-memory record set filled by the data-loading side.
#[derive(Debug, Clone, Default)]
pub struct PersonGraph {
    pub people: BTreeMap<PersonId, Person>,
}

impl PersonGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, person: Person) {
        self.people.insert(person.id.clone(), person);
    }

    /// Adds a batch of records; a later record for the same id replaces the earlier one.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = Person>) {
        for person in batch {
            self.insert(person);
        }
    }

    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.people.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}
