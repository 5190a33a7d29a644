use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub skill: String,
    pub rating: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonRepr {
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<SkillEntry>,
}

/// Sparse PUT body; only the fields present are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub skills: Option<Vec<SkillEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillFrequency {
    pub skill: String,
    pub frequency: i64,
}

#[derive(Debug, Serialize)]
pub struct SkillListResponse {
    pub skills: Vec<SkillFrequency>,
}

/// Raw query strings; parsed by the handler so a bad value maps to 400
/// instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SkillListQuery {
    pub min_frequency: Option<String>,
    pub max_frequency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRecord {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub skills: Vec<SkillEntry>,
}

/// Path key for `/users/{key}`: a numeric string addresses by id, anything
/// else by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonKey {
    Id(i64),
    Email(String),
}

impl PersonKey {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Email(raw.to_string()),
        }
    }
}
