//! Backend-agnostic predicates over face metadata

use crate::models::{FaceRecord, GROUP_ID_KEY, PERSON_ID_KEY};

/// Payload field a predicate can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceField {
    PersonId,
    GroupId,
}

impl FaceField {
    pub fn key(&self) -> &'static str {
        match self {
            FaceField::PersonId => PERSON_ID_KEY,
            FaceField::GroupId => GROUP_ID_KEY,
        }
    }

    fn value_of<'a>(&self, record: &'a FaceRecord) -> &'a str {
        match self {
            FaceField::PersonId => &record.person_id,
            FaceField::GroupId => &record.group_id,
        }
    }
}

/// Exact match of one payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: FaceField,
    pub value: String,
}

/// Conjunction of exact field matches. No conditions means "match all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacePredicate {
    conditions: Vec<FieldMatch>,
}

impl FacePredicate {
    /// Build the predicate for an optional person and group.
    pub fn build(person_id: Option<&str>, group_id: Option<&str>) -> Self {
        let mut conditions = Vec::with_capacity(2);

        if let Some(group_id) = group_id {
            conditions.push(FieldMatch {
                field: FaceField::GroupId,
                value: group_id.to_string(),
            });
        }
        if let Some(person_id) = person_id {
            conditions.push(FieldMatch {
                field: FaceField::PersonId,
                value: person_id.to_string(),
            });
        }

        Self { conditions }
    }

    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[FieldMatch] {
        &self.conditions
    }

    pub fn matches(&self, record: &FaceRecord) -> bool {
        self.conditions
            .iter()
            .all(|c| c.field.value_of(record) == c.value)
    }
}
