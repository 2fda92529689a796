//! Types for the batch pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::errors::CompositeError;

/// Stages of a batch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Store,
    Parse,
    History,
    GenerateArtifacts,
    Dispatch,
    Aggregate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Store => "store",
            Self::Parse => "parse",
            Self::History => "history",
            Self::GenerateArtifacts => "generate_artifacts",
            Self::Dispatch => "dispatch",
            Self::Aggregate => "aggregate",
        }
    }
}

/// A payment recipient read from the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Full name, also the key into the recipient mapping.
    pub full_name: String,
    /// Personal account number.
    pub personal_account: String,
    /// Payment purpose.
    pub purpose: String,
    /// Budget classification code.
    pub budget_code: String,
    /// Territory code.
    pub territory_code: String,
    /// Amount as written in the source file.
    pub amount: String,
}

impl Beneficiary {
    pub fn new(full_name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            amount: amount.into(),
            ..Default::default()
        }
    }

    /// Whether the name is non-blank.
    pub fn has_name(&self) -> bool {
        !self.full_name.trim().is_empty()
    }

    /// Key used to look up the delivery address.
    pub fn mapping_key(&self) -> String {
        normalize_key(&self.full_name)
    }

    /// File-name-safe form of the name.
    pub fn file_stem(&self) -> String {
        self.full_name.trim().replace(' ', "_")
    }

    /// Amount with `.` as separator and at least two decimal places.
    ///
    /// `"1230"` becomes `"1230.00"` and `"230,4"` becomes `"230.40"`.
    /// Longer fractional parts are kept as written.
    pub fn normalized_amount(&self) -> String {
        let amount = self.amount.trim().replace(',', ".");
        let (whole, fraction) = match amount.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (amount.as_str(), ""),
        };
        let whole = if whole.is_empty() { "0" } else { whole };

        format!("{}.{:0<2}", whole, fraction)
    }
}

/// Payee banking credentials stamped on every artifact of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: String,
    pub settlement_account: String,
    pub bank_name: String,
    pub bic: String,
    pub correspondent_account: String,
    pub payee_inn: String,
    pub kpp: String,
    /// Extra payment-code parameters, passed through verbatim.
    #[serde(default)]
    pub extra_params: String,
}

/// Beneficiary identity to delivery address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientMapping {
    addresses: BTreeMap<String, String>,
}

impl RecipientMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. The name is normalized like [`Beneficiary::mapping_key`].
    pub fn insert(&mut self, full_name: &str, address: impl Into<String>) {
        self.addresses
            .insert(normalize_key(full_name), address.into().trim().to_string());
    }

    /// The beneficiary's address, if one is mapped and non-empty.
    pub fn resolve(&self, beneficiary: &Beneficiary) -> Option<&str> {
        self.addresses
            .get(&beneficiary.mapping_key())
            .map(String::as_str)
            .filter(|address| !address.is_empty())
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.addresses
            .iter()
            .map(|(name, address)| (name.as_str(), address.as_str()))
    }
}

impl<N: AsRef<str>, A: Into<String>> FromIterator<(N, A)> for RecipientMapping {
    fn from_iter<I: IntoIterator<Item = (N, A)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (name, address) in iter {
            mapping.insert(name.as_ref(), address);
        }
        mapping
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Settings snapshot read once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSettings {
    /// `None` until a mapping has been uploaded.
    pub mapping: Option<RecipientMapping>,
    /// Address messages are sent from.
    pub sender_address: String,
}

/// A template prepared from the organization profile, reused for every beneficiary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTemplate {
    pub path: PathBuf,
}

impl ArtifactTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// What a batch produced, returned on full and partial success alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    /// Identifier used in logs for this batch.
    pub batch_id: Uuid,
    /// Delivery address to artifact path, for every mapped beneficiary.
    pub artifacts_by_recipient: BTreeMap<String, PathBuf>,
    /// Number of messages the transport accepted.
    pub sent_count: usize,
}

/// Non-fatal result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every beneficiary was mapped and every delivery succeeded.
    Succeeded(BatchOutput),
    /// Some beneficiaries were unmapped or some deliveries failed.
    PartiallySucceeded {
        output: BatchOutput,
        error: CompositeError,
    },
}

impl BatchOutcome {
    pub fn output(&self) -> &BatchOutput {
        match self {
            Self::Succeeded(output) => output,
            Self::PartiallySucceeded { output, .. } => output,
        }
    }

    pub fn error(&self) -> Option<&CompositeError> {
        match self {
            Self::Succeeded(_) => None,
            Self::PartiallySucceeded { error, .. } => Some(error),
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartiallySucceeded { .. })
    }

    pub fn into_parts(self) -> (BatchOutput, Option<CompositeError>) {
        match self {
            Self::Succeeded(output) => (output, None),
            Self::PartiallySucceeded { output, error } => (output, Some(error)),
        }
    }
}
