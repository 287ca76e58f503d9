use std::borrow::Cow;

use chrono::{Duration, NaiveDate};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::job::en::Title;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use datagen_core::{ColumnKind, ColumnParams};

use crate::errors::ProviderError;

const SAFE_TLDS: &[&str] = &["com", "net", "org"];
const SENTENCE_WORDS: std::ops::Range<usize> = 4..10;

/// One generated row, values in compiled field order.
pub type Row = Vec<GeneratedValue>;

/// Generated value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl GeneratedValue {
    /// Text as written to a CSV field; text values are borrowed.
    pub fn to_csv(&self) -> Cow<'_, str> {
        match self {
            GeneratedValue::Int(value) => Cow::Owned(value.to_string()),
            GeneratedValue::Text(value) => Cow::Borrowed(value.as_str()),
            GeneratedValue::Date(value) => Cow::Owned(value.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            GeneratedValue::Date(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for GeneratedValue {
    fn from(value: &str) -> Self {
        GeneratedValue::Text(value.to_string())
    }
}

impl From<String> for GeneratedValue {
    fn from(value: String) -> Self {
        GeneratedValue::Text(value)
    }
}

impl From<i64> for GeneratedValue {
    fn from(value: i64) -> Self {
        GeneratedValue::Int(value)
    }
}

/// Produces one value of a column kind per call.
pub trait ValueSource {
    fn generate(
        &mut self,
        kind: ColumnKind,
        params: &ColumnParams,
    ) -> Result<GeneratedValue, ProviderError>;
}

/// Last day `date` columns may produce unless a provider is given another.
pub fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Faker-backed value source over a seedable ChaCha generator.
///
/// Output depends only on the seed and the reference date, never on the
/// wall clock.
#[derive(Debug, Clone)]
pub struct ValueProvider {
    rng: ChaCha8Rng,
    reference_date: NaiveDate,
}

impl ValueProvider {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            reference_date: default_reference_date(),
        }
    }

    /// Draw dates from the Unix epoch up to and including `date`.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    /// Uniform integer in `[min, max]`, both inclusive.
    pub fn random_int(&mut self, min: i64, max: i64) -> Result<i64, ProviderError> {
        if min > max {
            return Err(ProviderError(format!(
                "random_int: min ({min}) is greater than max ({max})"
            )));
        }
        Ok(self.rng.random_range(min..=max))
    }

    /// Between `nb_min` and `nb_max` lorem sentences joined by single spaces.
    pub fn sentences_variable(&mut self, nb_min: i64, nb_max: i64) -> Result<String, ProviderError> {
        if nb_min < 1 || nb_min > nb_max {
            return Err(ProviderError(format!(
                "sentences_variable_str: invalid sentence range {nb_min}..={nb_max}"
            )));
        }
        let count = self.rng.random_range(nb_min..=nb_max);
        let mut sentences = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let sentence: String = Sentence(SENTENCE_WORDS).fake_with_rng(&mut self.rng);
            sentences.push(sentence);
        }
        Ok(sentences.join(" "))
    }

    /// Uniform day between the Unix epoch and the reference date.
    fn date(&mut self) -> NaiveDate {
        let epoch = NaiveDate::default();
        let span = (self.reference_date - epoch).num_days().max(0);
        epoch + Duration::days(self.rng.random_range(0..=span))
    }

    fn address(&mut self) -> String {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        let city: String = CityName().fake_with_rng(&mut self.rng);
        let state: String = StateAbbr().fake_with_rng(&mut self.rng);
        let zip: String = ZipCode().fake_with_rng(&mut self.rng);
        format!("{number} {street}\n{city}, {state} {zip}")
    }

    fn safe_domain_name(&mut self) -> String {
        let word: String = Word().fake_with_rng(&mut self.rng);
        let tld = SAFE_TLDS[self.rng.random_range(0..SAFE_TLDS.len())];
        format!("{}.example.{tld}", word.to_lowercase())
    }
}

impl ValueSource for ValueProvider {
    fn generate(
        &mut self,
        kind: ColumnKind,
        params: &ColumnParams,
    ) -> Result<GeneratedValue, ProviderError> {
        let value = match kind {
            ColumnKind::Name => GeneratedValue::Text(Name().fake_with_rng(&mut self.rng)),
            ColumnKind::RandomInt => {
                let min = required(params, kind, "min")?;
                let max = required(params, kind, "max")?;
                GeneratedValue::Int(self.random_int(min, max)?)
            }
            ColumnKind::Job => GeneratedValue::Text(Title().fake_with_rng(&mut self.rng)),
            ColumnKind::SafeEmail => GeneratedValue::Text(SafeEmail().fake_with_rng(&mut self.rng)),
            ColumnKind::PhoneNumber => {
                GeneratedValue::Text(PhoneNumber().fake_with_rng(&mut self.rng))
            }
            ColumnKind::SafeDomainName => GeneratedValue::Text(self.safe_domain_name()),
            ColumnKind::Company => {
                GeneratedValue::Text(CompanyName().fake_with_rng(&mut self.rng))
            }
            ColumnKind::Address => GeneratedValue::Text(self.address()),
            ColumnKind::Date => GeneratedValue::Date(self.date()),
            ColumnKind::SentencesVariable => {
                let nb_min = required(params, kind, "nb_min")?;
                let nb_max = required(params, kind, "nb_max")?;
                GeneratedValue::Text(self.sentences_variable(nb_min, nb_max)?)
            }
        };
        Ok(value)
    }
}

fn required(params: &ColumnParams, kind: ColumnKind, key: &str) -> Result<i64, ProviderError> {
    params
        .get(key)
        .ok_or_else(|| ProviderError(format!("{kind}: missing param '{key}'")))
}
