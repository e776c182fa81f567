// Account Entity - identity assigned by the store, values overwritable
//
// "The id is IDENTITY (never changes), balance/date/type are VALUES"
//
// - `id` is None until the store persists the record
// - `AccountType` travels as its string name, never as an ordinal

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    /// Current account (deposits, withdrawals, transfers at any time)
    Checking,

    /// Savings account (longer-term, interest-bearing)
    Savings,
}

impl AccountType {
    pub const ALL: [AccountType; 2] = [AccountType::Checking, AccountType::Savings];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown account type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown account type `{0}` (expected CHECKING or SAVINGS)")]
pub struct UnknownAccountType(pub String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHECKING" => Ok(AccountType::Checking),
            "SAVINGS" => Ok(AccountType::Savings),
            other => Err(UnknownAccountType(other.to_string())),
        }
    }
}

impl Serialize for AccountType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccountType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Writable values of an account (everything except the identity)
#[derive(Debug, Clone, PartialEq)]
pub struct AccountFields {
    pub balance: f64,
    pub creation_date: NaiveDate,
    pub account_type: AccountType,
}

/// Account Entity
///
/// Identity: `id` (assigned by the store, never changes)
/// Values: balance, creation date, account type (overwritten by update)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(deserialize_with = "finite_balance")]
    pub balance: f64,

    pub creation_date: NaiveDate,

    pub account_type: AccountType,
}

impl Account {
    /// Build an account that has not been persisted yet
    pub fn new(balance: f64, creation_date: NaiveDate, account_type: AccountType) -> Self {
        Account {
            id: None,
            balance,
            creation_date,
            account_type,
        }
    }

    /// Attach the identity handed out by a store
    pub fn with_id(id: i64, fields: AccountFields) -> Self {
        Account {
            id: Some(id),
            balance: fields.balance,
            creation_date: fields.creation_date,
            account_type: fields.account_type,
        }
    }

    /// Writable values, dropping any identity (client-supplied ids are ignored)
    pub fn fields(&self) -> AccountFields {
        AccountFields {
            balance: self.balance,
            creation_date: self.creation_date,
            account_type: self.account_type,
        }
    }

    /// Overwrite values in place; identity is untouched
    pub fn apply(&mut self, fields: AccountFields) {
        self.balance = fields.balance;
        self.creation_date = fields.creation_date;
        self.account_type = fields.account_type;
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// NaN and infinities cannot be stored in a REAL column nor written back as JSON
fn finite_balance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let balance = f64::deserialize(deserializer)?;
    if !balance.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "balance must be a finite number, got {balance}"
        )));
    }
    Ok(balance)
}
