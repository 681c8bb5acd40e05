// src/models/person.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DedupeError;

/// A person already stored in the family tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A person about to be written. It has no id or timestamp until the store
/// accepts it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<String>,
}

impl CandidatePerson {
    /// Builds a candidate from raw form input. The name is trimmed and must not
    /// be blank; blank father fields are dropped.
    pub fn new(
        name: &str,
        father_name: Option<&str>,
        father_id: Option<&str>,
    ) -> Result<Self, DedupeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DedupeError::InvalidInput(
                "person name must not be blank".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            father_name: non_blank(father_name),
            father_id: non_blank(father_id),
        })
    }

    /// Shorthand for a candidate with only a name, used mostly by previews.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            father_name: None,
            father_id: None,
        }
    }

    pub fn with_father_name(mut self, father_name: &str) -> Self {
        self.father_name = Some(father_name.to_string());
        self
    }

    pub fn with_father_id(mut self, father_id: &str) -> Self {
        self.father_id = Some(father_id.to_string());
        self
    }

    /// Fills in whichever father field is missing using the current people
    /// set: a name-only father is linked by a case-insensitive exact name
    /// match, and an id-only father gets its display name copied over.
    pub fn resolve_father(&mut self, people: &[Person]) {
        if self.father_id.is_none() {
            if let Some(father_name) = &self.father_name {
                let wanted = father_name.to_lowercase();
                self.father_id = people
                    .iter()
                    .find(|p| p.name.to_lowercase() == wanted)
                    .map(|father| father.id.clone());
            }
        } else if self.father_name.is_none() {
            if let Some(father_id) = &self.father_id {
                self.father_name = people
                    .iter()
                    .find(|p| &p.id == father_id)
                    .map(|father| father.name.clone());
            }
        }
    }

    /// Turns the candidate into a stored record with the given identity.
    pub fn into_person(self, id: String, created_at: DateTime<Utc>) -> Person {
        Person {
            id,
            name: self.name,
            father_name: self.father_name,
            father_id: self.father_id,
            created_at,
        }
    }
}

/// Partial update of a stored person. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub father_id: Option<String>,
}

impl PersonUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.father_name.is_none() && self.father_id.is_none()
    }

    /// Applies the update in place. A blank name is rejected, blank father
    /// fields clear the stored value.
    pub fn apply_to(&self, person: &mut Person) -> Result<(), DedupeError> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DedupeError::InvalidInput(
                    "person name must not be blank".to_string(),
                ));
            }
            person.name = name.to_string();
        }
        if let Some(father_name) = &self.father_name {
            person.father_name = non_blank(Some(father_name.as_str()));
        }
        if let Some(father_id) = &self.father_id {
            person.father_id = non_blank(Some(father_id.as_str()));
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
