//! Creator payout profile.
//!
//! Where a creator wants ticket sales and tips paid out. The profile is
//! validated like an [`EventDraft`](crate::draft::EventDraft) and kept in a
//! [`PayoutSlot`].

use crate::draft::FieldError;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Key under which the serialized profile is stored.
pub const PAYOUT_KEY: &str = "payout_profile";

/// Payment rail the payout goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutProvider {
    /// Paystack
    Paystack,
    /// Flutterwave
    Flutterwave,
    /// M-Pesa
    Mpesa,
    /// MTN Mobile Money
    MtnMomo,
}

/// Contents of the payout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutProfile {
    /// Legal name of the creator
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone number
    pub phone: String,
    /// Country of residence
    pub country: String,
    /// Preferred provider, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<PayoutProvider>,
    /// Name on the receiving account
    pub account_name: String,
    /// Bank account or wallet number
    pub account_number: String,
    /// Bank or wallet operator
    pub bank_or_wallet: String,
}

impl Default for PayoutProfile {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            country: String::new(),
            provider: Some(PayoutProvider::Paystack),
            account_name: String::new(),
            account_number: String::new(),
            bank_or_wallet: String::new(),
        }
    }
}

/// Every rule a payout profile broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payout profile has {} invalid field(s): {}", .0.len(), join(.0))]
pub struct PayoutErrors(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PayoutErrors {
    /// Rejected fields in form order
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` was rejected
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

/// Loose email check: one `@`, a dotted domain and no stray characters.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let local_ok = local
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'));
    let domain_ok = domain
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-'));

    local_ok && domain_ok && domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

impl PayoutProfile {
    /// Check the form rules, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutErrors`] listing each invalid field.
    pub fn validate(&self) -> Result<(), PayoutErrors> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &'static str, message: &'static str| {
            if !ok {
                errors.push(FieldError { field, message });
            }
        };

        check(min_chars(&self.full_name, 2), "fullName", "Full name is required");
        check(is_valid_email(&self.email), "email", "Valid email required");
        check(min_chars(&self.phone, 6), "phone", "Phone is required");
        check(min_chars(&self.country, 2), "country", "Country required");
        check(
            min_chars(&self.account_name, 2),
            "accountName",
            "Account name required",
        );
        check(
            min_chars(&self.account_number, 3),
            "accountNumber",
            "Account or wallet number required",
        );
        check(
            min_chars(&self.bank_or_wallet, 2),
            "bankOrWallet",
            "Bank or Wallet provider required",
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PayoutErrors(errors))
        }
    }
}

/// Errors from [`PayoutSlot`].
#[derive(Debug, Error)]
pub enum PayoutSlotError {
    /// The profile failed validation and was not stored
    #[error(transparent)]
    Invalid(#[from] PayoutErrors),

    /// The stored text could not be (de)serialized
    #[error("payout profile could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// In-memory slot holding one serialized payout profile.
#[derive(Debug, Default)]
pub struct PayoutSlot {
    stored: Mutex<Option<String>>,
}

impl PayoutSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `profile`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`PayoutSlotError::Invalid`] if the profile breaks a form rule;
    /// nothing is stored in that case.
    pub fn save(&self, profile: &PayoutProfile) -> Result<(), PayoutSlotError> {
        profile.validate()?;
        let json = serde_json::to_string(profile)?;
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        tracing::info!(
            key = PAYOUT_KEY,
            provider = ?profile.provider,
            country = %profile.country,
            "Payout profile saved"
        );
        Ok(())
    }

    /// Read back the stored profile.
    ///
    /// # Errors
    ///
    /// [`PayoutSlotError::Serialization`] if the stored text is not a profile.
    pub fn load(&self) -> Result<Option<PayoutProfile>, PayoutSlotError> {
        let stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        stored
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(PayoutSlotError::from)
    }

    /// Raw JSON as stored
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
