//! String-keyed call arguments, as they arrive across the dispatch boundary.
//!
//! Every map keeps the order the caller wrote it in. Keys are not checked against a
//! table here; the compilers do that once the target descriptor is known.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::value::Row;

/// Options accepted by `findFirst`/`findMany` and by nested includes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FindArgs {
    #[serde(rename = "where", default)]
    pub where_: Option<WhereCondition>,
    #[serde(default)]
    pub select: Option<Selection>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub take: Option<u32>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub include: Option<Includes>,
}

/// Column → flag. Only `true` flags select a column.
pub type Selection = HashMap<String, bool>;

/// Conjunction of per-column conditions, in caller order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, JsonValue>")]
pub struct WhereCondition(Vec<(String, Condition)>);

impl WhereCondition {
    pub fn from_terms(terms: impl IntoIterator<Item = (String, Condition)>) -> Self {
        Self(terms.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Condition)> {
        self.0.iter()
    }
}

impl TryFrom<Map<String, JsonValue>> for WhereCondition {
    type Error = String;

    fn try_from(map: Map<String, JsonValue>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(column, value)| {
                let condition = Condition::from_json(value)
                    .map_err(|err| format!("invalid condition on `{column}`: {err}"))?;
                Ok((column, condition))
            })
            .collect::<Result<Vec<_>, String>>()
            .map(Self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A bare literal: implicit equality.
    Equals(JsonValue),
    Operators(OperatorSet),
}

impl Condition {
    fn from_json(value: JsonValue) -> Result<Self, String> {
        match value {
            JsonValue::Object(ops) => OperatorSet::from_map(ops).map(Self::Operators),
            JsonValue::Array(_) => Err("lists are only accepted by the `in` operator".into()),
            scalar => Ok(Self::Equals(scalar)),
        }
    }
}

/// Operators present on one column. `Some(JsonValue::Null)` is an explicit null operand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSet {
    pub eq: Option<JsonValue>,
    pub ne: Option<JsonValue>,
    pub gt: Option<JsonValue>,
    pub gte: Option<JsonValue>,
    pub lt: Option<JsonValue>,
    pub lte: Option<JsonValue>,
    pub in_: Option<Vec<JsonValue>>,
}

impl OperatorSet {
    fn from_map(map: Map<String, JsonValue>) -> Result<Self, String> {
        let mut set = Self::default();
        for (op, operand) in map {
            let slot = match op.as_str() {
                "eq" => &mut set.eq,
                "ne" => &mut set.ne,
                "gt" => &mut set.gt,
                "gte" => &mut set.gte,
                "lt" => &mut set.lt,
                "lte" => &mut set.lte,
                "in" => {
                    let JsonValue::Array(values) = operand else {
                        return Err("`in` expects a list".into());
                    };
                    if values.iter().any(is_compound) {
                        return Err("`in` expects a list of scalars".into());
                    }
                    set.in_ = Some(values);
                    continue;
                }
                other => return Err(format!("unknown operator `{other}`")),
            };
            if is_compound(&operand) {
                return Err(format!("`{op}` expects a scalar operand"));
            }
            *slot = Some(operand);
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_compound(value: &JsonValue) -> bool {
    matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort keys, left to right. A `null` direction is ascending.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, JsonValue>")]
pub struct OrderBy(Vec<(String, Direction)>);

impl OrderBy {
    pub fn push(&mut self, column: impl Into<String>, direction: Direction) {
        self.0.push((column.into(), direction));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Direction)> {
        self.0.iter()
    }
}

impl TryFrom<Map<String, JsonValue>> for OrderBy {
    type Error = String;

    fn try_from(map: Map<String, JsonValue>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(column, direction)| {
                let direction = match direction {
                    JsonValue::Null => Direction::Asc,
                    other => serde_json::from_value(other).map_err(|_| {
                        format!("order direction for `{column}` must be \"asc\" or \"desc\"")
                    })?,
                };
                Ok((column, direction))
            })
            .collect::<Result<Vec<_>, String>>()
            .map(Self)
    }
}

#[derive(Debug, Clone)]
pub enum Include {
    /// `true` joins every column of the related table; `false` is not a request.
    Flag(bool),
    Nested(Box<FindArgs>),
}

/// Relation name → include request, in caller order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Map<String, JsonValue>")]
pub struct Includes(Vec<(String, Include)>);

impl Includes {
    pub fn push(&mut self, relation: impl Into<String>, include: Include) {
        self.0.push((relation.into(), include));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Include)> {
        self.0.iter()
    }
}

impl TryFrom<Map<String, JsonValue>> for Includes {
    type Error = String;

    fn try_from(map: Map<String, JsonValue>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(relation, value)| {
                let include = match value {
                    JsonValue::Null => Include::Flag(false),
                    JsonValue::Bool(flag) => Include::Flag(flag),
                    nested @ JsonValue::Object(_) => {
                        let args = serde_json::from_value(nested)
                            .map_err(|err| format!("include `{relation}`: {err}"))?;
                        Include::Nested(Box::new(args))
                    }
                    _ => return Err(format!("include `{relation}` must be a flag or options")),
                };
                Ok((relation, include))
            })
            .collect::<Result<Vec<_>, String>>()
            .map(Self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateArgs {
    pub data: Row,
}

/// `update`: `where` is required, but may be `{}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateArgs {
    #[serde(rename = "where")]
    pub where_: WhereCondition,
    pub data: Row,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateManyArgs {
    #[serde(rename = "where", default)]
    pub where_: Option<WhereCondition>,
    pub data: Row,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAllArgs {
    pub data: Row,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertArgs {
    #[serde(rename = "where", default)]
    pub where_: Option<WhereCondition>,
    #[serde(default)]
    pub update: Row,
    pub create: Row,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteArgs {
    #[serde(rename = "where")]
    pub where_: WhereCondition,
}

/// `deleteMany` and `count`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterArgs {
    #[serde(rename = "where", default)]
    pub where_: Option<WhereCondition>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_find_args_decoding() {
        let args: FindArgs = serde_json::from_value(json!({
            "where": { "role": "ADMIN", "createdAt": { "gte": 10, "lt": 20 } },
            "select": { "id": true, "name": false },
            "orderBy": { "name": "desc", "id": null },
            "take": 5,
            "skip": 2,
            "include": { "printers": true, "templates": { "take": 1 } }
        }))
        .unwrap();

        let where_ = args.where_.unwrap();
        let terms: Vec<_> = where_.iter().collect();
        assert_eq!(terms[0], &("role".to_string(), Condition::Equals(json!("ADMIN"))));
        assert!(matches!(
            &terms[1].1,
            Condition::Operators(OperatorSet { gte: Some(_), lt: Some(_), eq: None, .. })
        ));

        let order: Vec<_> = args.order_by.unwrap().iter().cloned().collect();
        assert_eq!(
            order,
            vec![
                ("name".to_string(), Direction::Desc),
                ("id".to_string(), Direction::Asc)
            ]
        );
        assert_eq!(args.take, Some(5));
        assert_eq!(args.skip, Some(2));

        let includes: Vec<_> = args.include.unwrap().iter().cloned().collect();
        assert!(matches!(includes[0].1, Include::Flag(true)));
        assert!(matches!(&includes[1].1, Include::Nested(nested) if nested.take == Some(1)));
    }

    #[test]
    fn test_explicit_null_operand_is_kept() {
        let condition: WhereCondition =
            serde_json::from_value(json!({ "userId": { "ne": null } })).unwrap();
        let (_, condition) = condition.iter().next().unwrap();
        assert_eq!(
            condition,
            &Condition::Operators(OperatorSet {
                ne: Some(JsonValue::Null),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_rejects_malformed_conditions() {
        assert!(serde_json::from_value::<WhereCondition>(json!({ "id": [1, 2] })).is_err());
        assert!(serde_json::from_value::<WhereCondition>(json!({ "id": { "like": "a%" } })).is_err());
        assert!(serde_json::from_value::<WhereCondition>(json!({ "id": { "in": 3 } })).is_err());
        assert!(serde_json::from_value::<WhereCondition>(json!({ "id": { "eq": [3] } })).is_err());
    }

    #[test]
    fn test_rejects_negative_window() {
        assert!(serde_json::from_value::<FindArgs>(json!({ "take": -1 })).is_err());
        assert!(serde_json::from_value::<FindArgs>(json!({ "skip": -3 })).is_err());
    }

    #[test]
    fn test_rejects_unknown_option() {
        assert!(serde_json::from_value::<FindArgs>(json!({ "limit": 3 })).is_err());
    }

    #[test]
    fn test_rejects_bad_direction() {
        assert!(serde_json::from_value::<FindArgs>(json!({ "orderBy": { "id": "up" } })).is_err());
    }

    #[test]
    fn test_false_and_null_includes_are_flags() {
        let includes: Includes =
            serde_json::from_value(json!({ "printers": false, "templates": null })).unwrap();
        assert!(includes
            .iter()
            .all(|(_, include)| matches!(include, Include::Flag(false))));
    }

    #[test]
    fn test_update_requires_where() {
        assert!(serde_json::from_value::<UpdateArgs>(json!({ "data": { "name": "x" } })).is_err());
        let args: UpdateManyArgs =
            serde_json::from_value(json!({ "data": { "name": "x" } })).unwrap();
        assert!(args.where_.is_none());
    }
}
