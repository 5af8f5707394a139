use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

/// Direction of a transaction. The sign of `amount` is implied by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "INCOME"),
            TransactionType::Expense => write!(f, "EXPENSE"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            other => Err(CoreError::ValidationError(format!(
                "Unknown transaction type '{other}' (expected INCOME or EXPENSE)"
            ))),
        }
    }
}

/// Payment channel a transaction went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bkash,
    Nagad,
    Bank,
}

impl PaymentMethod {
    /// All methods in display order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Bkash,
        PaymentMethod::Nagad,
        PaymentMethod::Bank,
    ];

    /// Lenient mapping used when decoding stored records:
    /// anything unrecognised is folded into `Cash`.
    pub fn from_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::Bkash => write!(f, "BKASH"),
            PaymentMethod::Nagad => write!(f, "NAGAD"),
            PaymentMethod::Bank => write!(f, "BANK"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "BKASH" => Ok(PaymentMethod::Bkash),
            "NAGAD" => Ok(PaymentMethod::Nagad),
            "BANK" => Ok(PaymentMethod::Bank),
            other => Err(CoreError::ValidationError(format!(
                "Unknown payment method '{other}' (expected CASH, BKASH, NAGAD or BANK)"
            ))),
        }
    }
}

/// A single income or expense entry.
///
/// Field names match the remote `transactions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Client-generated id (milliseconds since epoch, stringified)
    pub id: String,

    /// Owner identity key (username, or email when the username is empty)
    #[serde(default)]
    pub user_id: String,

    pub description: String,

    /// Always non-negative; the remote store hands it back as a numeric string
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[serde(default, deserialize_with = "deserialize_method")]
    pub method: PaymentMethod,

    /// Offset-less timestamps from the store are read as UTC
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Signed contribution of this entry to a balance.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Typed submission form for a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub method: PaymentMethod,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionType,
        method: PaymentMethod,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            method,
        }
    }

    /// Required-field and amount checks, run before anything is sent remotely.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.description.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Description must not be empty".into(),
            ));
        }
        validate_amount(self.amount)?;
        if self.amount == 0.0 {
            return Err(CoreError::ValidationError(
                "Amount must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Turn a validated draft into a full record.
    pub fn into_transaction(
        self,
        id: String,
        user_id: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id,
            user_id: user_id.into(),
            description: self.description.trim().to_string(),
            amount: self.amount,
            kind: self.kind,
            method: self.method,
            date,
        }
    }
}

/// Amounts must be finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !amount.is_finite() {
        return Err(CoreError::ValidationError(format!(
            "Amount must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Amount must not be negative, got {amount}"
        )));
    }
    Ok(())
}

/// Millisecond-timestamp id, as generated at submission time.
pub fn generate_id(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

// ── Lenient decoding ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{s}': {e}")))?,
    };
    validate_amount(amount).map_err(serde::de::Error::custom)?;
    Ok(amount)
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<PaymentMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(PaymentMethod::from_lenient).unwrap_or_default())
}

/// `null` decodes to the type's default, like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 timestamps, or a naive ISO timestamp taken as UTC
/// (what a `timestamp without time zone` column returns).
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if let Ok(at) = trimmed.parse::<DateTime<Utc>>() {
        return Ok(at);
    }
    trimmed
        .parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}
