//! Deterministic orderings for partners, children and siblings.
//!
//! All sorts are stable, so records that tie on every key keep the order
//! in which the data source listed them.

use crate::ir::{
    ChildLink, PartialDate, Person, PersonGraph, PersonId, SiblingLink, SpouseLink, date_sort_key,
};

fn child_birth_date(link: &ChildLink, graph: &PersonGraph) -> Option<PartialDate> {
    link.birth_date
        .or_else(|| graph.get(&link.id).and_then(|child| child.birth_date))
}

fn birth_order_key(order: u16) -> u16 {
    if order == 0 { u16::MAX } else { order }
}

/// Marriage date ascending, undated last, ties broken by the birth date of
/// the first child shared with that partner.
pub fn partner_order<'a>(person: &'a Person, graph: &PersonGraph) -> Vec<&'a SpouseLink> {
    let mut partners: Vec<&SpouseLink> = person.spouses.iter().collect();
    partners.sort_by_key(|spouse| {
        let first_child = person
            .children
            .iter()
            .filter(|child| child.co_parent_id.as_ref() == Some(&spouse.id))
            .filter_map(|child| child_birth_date(child, graph))
            .min();
        (
            date_sort_key(spouse.marriage_date),
            date_sort_key(first_child),
        )
    });
    partners
}

/// Children grouped by co-parent in partner order (unknown co-parents last),
/// then by birth date.
pub fn child_order<'a>(
    person: &'a Person,
    partners: &[&SpouseLink],
    graph: &PersonGraph,
) -> Vec<&'a ChildLink> {
    let rank = |co_parent: Option<&PersonId>| {
        co_parent
            .and_then(|id| partners.iter().position(|spouse| &spouse.id == id))
            .unwrap_or(partners.len())
    };
    let mut children: Vec<&ChildLink> = person.children.iter().collect();
    children.sort_by_key(|child| {
        (
            rank(child.co_parent_id.as_ref()),
            date_sort_key(child_birth_date(child, graph)),
            birth_order_key(child.birth_order),
        )
    });
    children
}

/// Birth date ascending with unknown dates last, then the recorded birth order.
pub fn sibling_order<'a>(person: &'a Person, graph: &PersonGraph) -> Vec<&'a SiblingLink> {
    let mut siblings: Vec<&SiblingLink> = person.siblings.iter().collect();
    siblings.sort_by_key(|sibling| {
        (
            date_sort_key(graph.get(&sibling.id).and_then(|record| record.birth_date)),
            birth_order_key(sibling.birth_order),
        )
    });
    siblings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Gender, SiblingType};

    fn spouse(id: &str, year: Option<i32>) -> SpouseLink {
        SpouseLink {
            id: PersonId::from(id),
            marriage_date: year.map(PartialDate::year),
        }
    }

    fn child(id: &str, co_parent: &str, year: Option<i32>) -> ChildLink {
        ChildLink {
            id: PersonId::from(id),
            co_parent_id: Some(PersonId::from(co_parent)),
            birth_order: 0,
            birth_date: year.map(PartialDate::year),
        }
    }

    #[test]
    fn undated_marriages_sort_last() {
        let mut person = Person::new("p", Gender::Male);
        person.spouses = vec![spouse("a", None), spouse("b", Some(1950)), spouse("c", Some(1940))];
        let graph = PersonGraph::new();
        let ids: Vec<&str> = partner_order(&person, &graph)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn undated_marriages_tie_break_on_first_shared_child() {
        let mut person = Person::new("p", Gender::Female);
        person.spouses = vec![spouse("a", None), spouse("b", None)];
        person.children = vec![child("k1", "a", Some(1970)), child("k2", "b", Some(1960))];
        let graph = PersonGraph::new();
        let ids: Vec<&str> = partner_order(&person, &graph)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn children_group_by_partner_then_birth() {
        let mut person = Person::new("p", Gender::Male);
        person.spouses = vec![spouse("a", Some(1950)), spouse("b", Some(1960))];
        person.children = vec![
            child("late-b", "b", Some(1965)),
            child("late-a", "a", Some(1958)),
            child("early-a", "a", Some(1952)),
            child("unknown", "zz", Some(1940)),
        ];
        let graph = PersonGraph::new();
        let partners = partner_order(&person, &graph);
        let ids: Vec<&str> = child_order(&person, &partners, &graph)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["early-a", "late-a", "late-b", "unknown"]);
    }

    #[test]
    fn siblings_without_dates_keep_listed_order_at_the_end() {
        let mut graph = PersonGraph::new();
        let mut older = Person::new("older", Gender::Male);
        older.birth_date = Some(PartialDate::year(1940));
        graph.insert(older);
        graph.insert(Person::new("x", Gender::Female));
        graph.insert(Person::new("y", Gender::Female));

        let mut person = Person::new("p", Gender::Male);
        person.siblings = ["x", "older", "y"]
            .iter()
            .map(|id| SiblingLink {
                id: PersonId::from(*id),
                sibling_type: SiblingType::Full,
                birth_order: 0,
            })
            .collect();
        let ids: Vec<&str> = sibling_order(&person, &graph)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["older", "x", "y"]);
    }
}
