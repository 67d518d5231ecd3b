use crate::ir::{
    ChildLink, Gender, PartialDate, Person, PersonGraph, PersonId, SiblingLink, SiblingType,
    SpouseLink,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,4})(?:-(\d{1,2})(?:-(\d{1,2}))?)?$").unwrap());

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("person records are not valid JSON or JSON5: {0}")]
    Syntax(String),
    #[error("person record #{index} has no id")]
    MissingId { index: usize },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PeopleFile {
    Wrapped { people: Vec<PersonRecord> },
    List(Vec<PersonRecord>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(i64),
    String(String),
}

impl IdValue {
    /// `0` and the empty string are "no person", the way genealogy exports mark absent parents.
    fn into_id(self) -> Option<PersonId> {
        match self {
            IdValue::Number(0) => None,
            IdValue::Number(val) => Some(PersonId(val.to_string())),
            IdValue::String(val) => {
                let trimmed = val.trim();
                if trimmed.is_empty() || trimmed == "0" {
                    None
                } else {
                    Some(PersonId(trimmed.to_string()))
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonRecord {
    id: Option<IdValue>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    death_date: Option<String>,
    #[serde(default)]
    is_living: Option<bool>,
    #[serde(default)]
    mother: Option<IdValue>,
    #[serde(default)]
    father: Option<IdValue>,
    #[serde(default)]
    spouses: Vec<SpouseRecord>,
    #[serde(default)]
    children: Vec<ChildRecord>,
    #[serde(default)]
    siblings: Vec<SiblingRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpouseRecord {
    id: IdValue,
    #[serde(default)]
    marriage_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildRecord {
    id: IdValue,
    #[serde(default)]
    co_parent_id: Option<IdValue>,
    #[serde(default)]
    birth_order: Option<u16>,
    #[serde(default)]
    birth_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiblingRecord {
    id: IdValue,
    #[serde(default)]
    sibling_type: Option<String>,
    #[serde(default)]
    birth_order: Option<u16>,
}

/// Parses a batch of person records.
///
/// Accepts either `{ "people": [...] }` or a bare array, as strict JSON or
/// as JSON5. Links that point at ids missing from the batch are kept; the
/// builder treats them as unloaded branches.
pub fn parse_person_graph(input: &str) -> Result<PersonGraph, ParseError> {
    let mut graph = PersonGraph::new();
    graph.merge(parse_person_batch(input)?);
    Ok(graph)
}

pub fn parse_person_batch(input: &str) -> Result<Vec<Person>, ParseError> {
    let file = match serde_json::from_str::<PeopleFile>(input) {
        Ok(file) => file,
        Err(json_err) => json5::from_str::<PeopleFile>(input)
            .map_err(|_| ParseError::Syntax(json_err.to_string()))?,
    };
    let records = match file {
        PeopleFile::Wrapped { people } => people,
        PeopleFile::List(people) => people,
    };

    let mut people = Vec::with_capacity(records.len());
    for (index, mut record) in records.into_iter().enumerate() {
        let id = record
            .id
            .take()
            .and_then(IdValue::into_id)
            .ok_or(ParseError::MissingId { index })?;
        people.push(convert_record(id, record));
    }
    Ok(people)
}

fn convert_record(id: PersonId, record: PersonRecord) -> Person {
    let spouses = record
        .spouses
        .into_iter()
        .filter_map(|spouse| {
            Some(SpouseLink {
                id: spouse.id.into_id()?,
                marriage_date: spouse.marriage_date.as_deref().and_then(parse_partial_date),
            })
        })
        .collect();
    let children = record
        .children
        .into_iter()
        .filter_map(|child| {
            Some(ChildLink {
                id: child.id.into_id()?,
                co_parent_id: child.co_parent_id.and_then(IdValue::into_id),
                birth_order: child.birth_order.unwrap_or(0),
                birth_date: child.birth_date.as_deref().and_then(parse_partial_date),
            })
        })
        .collect();
    let siblings = record
        .siblings
        .into_iter()
        .filter_map(|sibling| {
            Some(SiblingLink {
                id: sibling.id.into_id()?,
                sibling_type: sibling
                    .sibling_type
                    .as_deref()
                    .map(parse_sibling_type)
                    .unwrap_or_default(),
                birth_order: sibling.birth_order.unwrap_or(0),
            })
        })
        .collect();

    Person {
        id,
        gender: record.gender.as_deref().map(parse_gender).unwrap_or_default(),
        birth_date: record.birth_date.as_deref().and_then(parse_partial_date),
        death_date: record.death_date.as_deref().and_then(parse_partial_date),
        is_living: record.is_living.unwrap_or(false),
        mother: record.mother.and_then(IdValue::into_id),
        father: record.father.and_then(IdValue::into_id),
        spouses,
        children,
        siblings,
    }
}

/// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. Zero components mean unknown;
/// a zero year or anything malformed yields `None`.
pub fn parse_partial_date(raw: &str) -> Option<PartialDate> {
    let caps = DATE_RE.captures(raw.trim())?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    if year == 0 {
        return None;
    }
    let month: u8 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let day: u8 = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    if month > 12 || day > 31 {
        return None;
    }
    // A day without a month carries no ordering information.
    let day = if month == 0 { 0 } else { day };
    Some(PartialDate::new(year, month, day))
}

fn parse_gender(raw: &str) -> Gender {
    match raw.trim().to_ascii_lowercase().as_str() {
        "male" | "m" => Gender::Male,
        "female" | "f" => Gender::Female,
        _ => Gender::Unknown,
    }
}

fn parse_sibling_type(raw: &str) -> SiblingType {
    match raw.trim().to_ascii_lowercase().as_str() {
        "paternal" | "half-paternal" => SiblingType::Paternal,
        "maternal" | "half-maternal" => SiblingType::Maternal,
        "adoptive" | "adopted" => SiblingType::Adoptive,
        _ => SiblingType::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wrapped_people() {
        let input = r#"{"people": [
            {"id": 10, "gender": "Male", "birthDate": "1950-04-00", "mother": 12, "father": 0,
             "spouses": [{"id": 20, "marriageDate": "1975"}],
             "children": [{"id": 30, "coParentId": 20, "birthOrder": 1, "birthDate": "1976-01-02"}],
             "siblings": [{"id": 11, "siblingType": "paternal", "birthOrder": 2}]}
        ]}"#;
        let graph = parse_person_graph(input).unwrap();
        let person = graph.get(&PersonId::from("10")).unwrap();
        assert_eq!(person.gender, Gender::Male);
        assert_eq!(person.birth_date, Some(PartialDate::new(1950, 4, 0)));
        assert_eq!(person.mother, Some(PersonId::from("12")));
        assert_eq!(person.father, None);
        assert_eq!(person.spouses[0].marriage_date, Some(PartialDate::year(1975)));
        assert_eq!(person.children[0].co_parent_id, Some(PersonId::from("20")));
        assert_eq!(person.siblings[0].sibling_type, SiblingType::Paternal);
    }

    #[test]
    fn parse_json5_list() {
        let input = "[{id: 'a', gender: 'f', isLiving: true,}, {id: 'b'}]";
        let graph = parse_person_graph(input).unwrap();
        assert_eq!(graph.len(), 2);
        let a = graph.get(&PersonId::from("a")).unwrap();
        assert_eq!(a.gender, Gender::Female);
        assert!(a.is_living);
    }

    #[test]
    fn missing_id_is_an_error() {
        let err = parse_person_graph(r#"[{"id": "a"}, {"gender": "male"}]"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingId { index: 1 }));
    }

    #[test]
    fn malformed_dates_become_none() {
        assert_eq!(parse_partial_date("0000-00-00"), None);
        assert_eq!(parse_partial_date("about 1900"), None);
        assert_eq!(parse_partial_date("1900-13-01"), None);
        assert_eq!(parse_partial_date(""), None);
        assert_eq!(parse_partial_date("1900-00-15"), Some(PartialDate::year(1900)));
        assert_eq!(parse_partial_date(" 1901-02-03 "), Some(PartialDate::new(1901, 2, 3)));
    }
}
