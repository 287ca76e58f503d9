use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::column::{ColumnKind, ColumnParams};
use crate::error::{Error, Result};
use crate::validation::{IssueCode, ValidationIssue, ValidationReport};

const INT_BOUND: i64 = 9_999_999;
const SENTENCES_BOUND: i64 = 100_000;

/// Integer parameter accepted by a column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: Option<i64>,
}

impl ParamSpec {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        min: i64,
        max: i64,
        default: Option<i64>,
    ) -> Self {
        Self {
            key,
            label,
            min,
            max,
            default,
        }
    }
}

/// Pair of parameters that must satisfy `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangePair {
    pub min: &'static str,
    pub max: &'static str,
}

/// Catalog entry describing one column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub tag: &'static str,
    pub label: &'static str,
    /// Key of the random-data provider backing this kind.
    pub provider: &'static str,
    pub params: &'static [ParamSpec],
    pub ranges: &'static [RangePair],
}

const RANDOM_INT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("min", "Min", -INT_BOUND, INT_BOUND, Some(0)),
    ParamSpec::new("max", "Max", -INT_BOUND, INT_BOUND, Some(9_999)),
];
const SENTENCES_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("nb_min", "Min sentences", 1, SENTENCES_BOUND, Some(3)),
    ParamSpec::new("nb_max", "Max sentences", 1, SENTENCES_BOUND, Some(6)),
];

const fn plain(kind: ColumnKind, tag: &'static str, label: &'static str) -> ColumnSpec {
    ColumnSpec {
        kind,
        tag,
        label,
        provider: tag,
        params: &[],
        ranges: &[],
    }
}

pub const BUILTIN_SPECS: &[ColumnSpec] = &[
    plain(ColumnKind::Name, "name", "Full name"),
    ColumnSpec {
        kind: ColumnKind::RandomInt,
        tag: "random_int",
        label: "Random integer",
        provider: "random_int",
        params: RANDOM_INT_PARAMS,
        ranges: &[RangePair {
            min: "min",
            max: "max",
        }],
    },
    plain(ColumnKind::Job, "job", "Job"),
    plain(ColumnKind::SafeEmail, "safe_email", "Email"),
    plain(ColumnKind::PhoneNumber, "phone_number", "Phone number"),
    plain(ColumnKind::SafeDomainName, "safe_domain_name", "Domain name"),
    plain(ColumnKind::Company, "company", "Company"),
    plain(ColumnKind::Address, "address", "Address"),
    plain(ColumnKind::Date, "date", "Date"),
    ColumnSpec {
        kind: ColumnKind::SentencesVariable,
        tag: "sentences_variable_str",
        label: "Sentences",
        provider: "sentences_variable_str",
        params: SENTENCES_PARAMS,
        ranges: &[RangePair {
            min: "nb_min",
            max: "nb_max",
        }],
    },
];

static BUILTIN: Lazy<ColumnRegistry> = Lazy::new(ColumnRegistry::with_builtin);

impl ColumnSpec {
    /// Validate raw parameters against this kind, applying defaults.
    ///
    /// All violations are collected; paths are relative to the column
    /// (`/params/<key>`).
    pub fn validate(
        &self,
        params: &Map<String, Value>,
    ) -> std::result::Result<ColumnParams, ValidationReport> {
        let mut report = ValidationReport::default();
        let mut resolved = ColumnParams::default();

        for key in params.keys() {
            if !self.params.iter().any(|spec| spec.key == key.as_str()) {
                report.push(
                    ValidationIssue::new(
                        IssueCode::UnknownParam,
                        format!("/params/{key}"),
                        format!("'{}' does not accept param '{key}'", self.tag),
                    )
                    .with_params([key.as_str()]),
                );
            }
        }

        for spec in self.params {
            let path = format!("/params/{}", spec.key);
            let Some(value) = params.get(spec.key) else {
                match spec.default {
                    Some(default) => resolved.insert(spec.key, default),
                    None => report.push(
                        ValidationIssue::new(
                            IssueCode::MissingParam,
                            path,
                            format!("missing required param '{}'", spec.key),
                        )
                        .with_params([spec.key]),
                    ),
                }
                continue;
            };

            match value.as_i64() {
                None => report.push(
                    ValidationIssue::new(
                        IssueCode::InvalidParamType,
                        path,
                        format!("'{}' must be an integer", spec.key),
                    )
                    .with_params([spec.key]),
                ),
                Some(value) if value < spec.min || value > spec.max => report.push(
                    ValidationIssue::new(
                        IssueCode::ParamOutOfBounds,
                        path,
                        format!(
                            "'{}' must be between {} and {}, got {value}",
                            spec.key, spec.min, spec.max
                        ),
                    )
                    .with_params([spec.key]),
                ),
                Some(value) => resolved.insert(spec.key, value),
            }
        }

        for range in self.ranges {
            let (Some(min), Some(max)) = (resolved.get(range.min), resolved.get(range.max)) else {
                continue;
            };
            if min > max {
                report.push(
                    ValidationIssue::new(
                        IssueCode::MinGreaterThanMax,
                        format!("/params/{}", range.min),
                        format!(
                            "'{}' ({min}) must be less than or equal to '{}' ({max})",
                            range.min, range.max
                        ),
                    )
                    .with_params([range.min, range.max]),
                );
            }
        }

        if report.is_ok() {
            Ok(resolved)
        } else {
            Err(report)
        }
    }
}

/// Flat catalog mapping a type tag to its column spec.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    specs: HashMap<&'static str, ColumnSpec>,
}

impl ColumnRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry populated with every built-in column kind.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for spec in BUILTIN_SPECS {
            registry.register(*spec);
        }
        registry
    }

    /// Shared built-in registry, constructed once.
    pub fn builtin() -> &'static ColumnRegistry {
        &BUILTIN
    }

    /// Add a kind, returning the spec it replaced under the same tag.
    pub fn register(&mut self, spec: ColumnSpec) -> Option<ColumnSpec> {
        self.specs.insert(spec.tag, spec)
    }

    pub fn resolve(&self, tag: &str) -> Result<&ColumnSpec> {
        self.specs
            .get(tag)
            .ok_or_else(|| Error::UnknownColumnType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.specs.contains_key(tag)
    }

    /// Specs ordered by kind, for stable listings.
    pub fn specs(&self) -> Vec<&ColumnSpec> {
        let mut specs: Vec<&ColumnSpec> = self.specs.values().collect();
        specs.sort_by_key(|spec| spec.kind);
        specs
    }
}
