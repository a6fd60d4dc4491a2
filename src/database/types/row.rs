//! Fetched rows

use super::value::SqlValue;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// One fetched row: column name to value, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, SqlValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: IndexMap::with_capacity(capacity),
        }
    }

    /// Append a column. A repeated name keeps its first position.
    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.insert(name.into(), value);
    }

    /// Value of a column by name
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.get(name)
    }

    /// Value of a column by position
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.columns.get_index(index).map(|(_, v)| v)
    }

    /// First column, used for scalar results
    pub fn first(&self) -> Option<&SqlValue> {
        self.get_index(0)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_first(self) -> Option<SqlValue> {
        self.columns.into_iter().next().map(|(_, v)| v)
    }

    /// Row as a JSON object, keeping column order
    pub fn to_json(&self) -> JsonValue {
        let mut obj = serde_json::Map::with_capacity(self.columns.len());
        for (name, value) in &self.columns {
            obj.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(obj)
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, SqlValue);
    type IntoIter = indexmap::map::IntoIter<String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_by_name_and_position() {
        let mut row = Row::new();
        row.push("id", SqlValue::BigInt(7));
        row.push("name", SqlValue::from("Nathalie"));

        assert_eq!(row.get("name"), Some(&SqlValue::from("Nathalie")));
        assert_eq!(row.get_index(0), Some(&SqlValue::BigInt(7)));
        assert_eq!(row.first(), Some(&SqlValue::BigInt(7)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_to_json_object() {
        let row: Row = vec![
            ("id".to_string(), SqlValue::Int(1)),
            ("active".to_string(), SqlValue::Bool(true)),
            ("note".to_string(), SqlValue::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            row.to_json(),
            serde_json::json!({"id": 1, "active": true, "note": null})
        );
    }
}
