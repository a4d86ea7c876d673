//! Row grouping: collapse upload rows onto one remote entity per key.

use std::collections::HashMap;
use std::fmt;

use common::model::schema::EntitySchema;

use super::cell;
use super::rows::SourceRow;

/// Key one or more rows collapse under. A parseable numeric id targets an
/// update; otherwise the natural key targets a create.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Id(i64),
    Name(String),
}

impl GroupKey {
    pub fn target_id(&self) -> Option<i64> {
        match self {
            GroupKey::Id(id) => Some(*id),
            GroupKey::Name(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Id(id) => write!(f, "{id}"),
            GroupKey::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub key: GroupKey,
    pub rows: Vec<SourceRow>,
}

impl EntityGroup {
    /// Line number reported for group-level failures.
    pub fn first_line(&self) -> usize {
        self.rows.first().map(|r| r.line).unwrap_or(0)
    }
}

// Rows with a blank natural key must not merge with each other; each keeps
// its own (invalid) group so each source row gets its own Error result.
#[derive(Clone, PartialEq, Eq, Hash)]
enum MapKey {
    Id(i64),
    Name(String),
    Lone(usize),
}

/// Group rows in first-seen order. The id column wins over the natural key;
/// ids are parsed with the float-then-int rule.
pub fn group_rows(schema: &EntitySchema, rows: &[SourceRow]) -> Vec<EntityGroup> {
    let mut order: Vec<MapKey> = Vec::new();
    let mut groups: HashMap<MapKey, EntityGroup> = HashMap::new();

    for row in rows {
        let id = if schema.id_column.is_empty() {
            None
        } else {
            cell::parse_id(row.get(schema.id_column))
        };
        let name = row.get(schema.name_column).trim().to_string();

        let (map_key, key) = match id {
            Some(id) => (MapKey::Id(id), GroupKey::Id(id)),
            None if name.is_empty() => (MapKey::Lone(row.line), GroupKey::Name(name)),
            None => (MapKey::Name(name.clone()), GroupKey::Name(name)),
        };

        if let Some(group) = groups.get_mut(&map_key) {
            group.rows.push(row.clone());
        } else {
            order.push(map_key.clone());
            groups.insert(
                map_key,
                EntityGroup {
                    key,
                    rows: vec![row.clone()],
                },
            );
        }
    }

    order
        .into_iter()
        .filter_map(|k| groups.remove(&k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn row(line: usize, pairs: &[(&str, &str)]) -> SourceRow {
        let cells: Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SourceRow::new(line, cells)
    }

    fn schema() -> EntitySchema {
        crate::catalog::find("timeoff_policy_sets").unwrap()
    }

    #[test]
    fn id_wins_over_name_and_accepts_floats() {
        let rows = vec![
            row(1, &[("id", "7.0"), ("name", "Set A")]),
            row(2, &[("id", ""), ("name", "Set B")]),
        ];
        let groups = group_rows(&schema(), &rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, GroupKey::Id(7));
        assert_eq!(groups[1].key, GroupKey::Name("Set B".to_string()));
    }

    #[test]
    fn rows_sharing_a_key_merge_in_order() {
        let rows = vec![
            row(1, &[("id", ""), ("name", "Set A")]),
            row(2, &[("id", "9"), ("name", "Set C")]),
            row(3, &[("id", ""), ("name", "Set A")]),
        ];
        let groups = group_rows(&schema(), &rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].first_line(), 1);
        assert_eq!(groups[1].key, GroupKey::Id(9));
    }

    #[test]
    fn blank_name_rows_stay_separate() {
        let rows = vec![
            row(1, &[("id", ""), ("name", "")]),
            row(2, &[("id", ""), ("name", "")]),
        ];
        let groups = group_rows(&schema(), &rows);
        assert_eq!(groups.len(), 2);
    }
}
