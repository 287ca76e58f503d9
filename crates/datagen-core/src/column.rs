use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One user-authored column definition, as stored with the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    /// Header name; must be non-empty and unique within the schema.
    pub name: String,
    /// Column type tag resolved through the registry (e.g. `random_int`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Position hint; ties keep input order.
    pub order: i64,
    /// Type-specific generation parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, order: i64) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            order,
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Closed set of column kinds the generator knows how to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Name,
    RandomInt,
    Job,
    SafeEmail,
    PhoneNumber,
    SafeDomainName,
    Company,
    Address,
    Date,
    #[serde(rename = "sentences_variable_str")]
    SentencesVariable,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 10] = [
        ColumnKind::Name,
        ColumnKind::RandomInt,
        ColumnKind::Job,
        ColumnKind::SafeEmail,
        ColumnKind::PhoneNumber,
        ColumnKind::SafeDomainName,
        ColumnKind::Company,
        ColumnKind::Address,
        ColumnKind::Date,
        ColumnKind::SentencesVariable,
    ];

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::RandomInt => "random_int",
            Self::Job => "job",
            Self::SafeEmail => "safe_email",
            Self::PhoneNumber => "phone_number",
            Self::SafeDomainName => "safe_domain_name",
            Self::Company => "company",
            Self::Address => "address",
            Self::Date => "date",
            Self::SentencesVariable => "sentences_variable_str",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_tag() == tag)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Validated parameters for one column, defaults already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnParams(BTreeMap<String, i64>);

impl ColumnParams {
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: i64) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl<const N: usize> From<[(&str, i64); N]> for ColumnParams {
    fn from(entries: [(&str, i64); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }
}
