use serde::{Deserialize, Serialize};

use super::errors::CourseError;

// ============================================================================
// Course Value Objects
// ============================================================================

/// Publishing lifecycle of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseState {
    #[default]
    Draft,
    Published,
    Archived,
}

impl CourseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseState::Draft => "draft",
            CourseState::Published => "published",
            CourseState::Archived => "archived",
        }
    }
}

impl std::fmt::Display for CourseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Course price. Zero means the course is free.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    pub const FREE: Price = Price(0.0);

    pub fn new(amount: f64) -> Result<Self, CourseError> {
        Self::validate(amount)?;
        Ok(Self(amount))
    }

    /// Rejects negative and non-finite amounts
    pub fn validate(amount: f64) -> Result<(), CourseError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CourseError::NegativePrice);
        }
        Ok(())
    }

    pub fn amount(&self) -> f64 {
        self.0
    }
}

/// ISO 4217 style currency code, e.g. "EUR"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Result<Self, CourseError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CourseError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
