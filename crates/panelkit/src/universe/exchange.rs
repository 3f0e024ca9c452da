//! CRSP exchange codes.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary listing exchanges in the CRSP name history (`exchcd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    /// New York Stock Exchange
    Nyse,

    /// American Stock Exchange
    Amex,

    /// NASDAQ Stock Market
    Nasdaq,
}

impl Exchange {
    /// Returns all exchanges.
    pub fn all() -> Vec<Self> {
        vec![Self::Nyse, Self::Amex, Self::Nasdaq]
    }

    /// Returns the CRSP exchange code.
    pub const fn code(&self) -> i64 {
        match self {
            Self::Nyse => 1,
            Self::Amex => 2,
            Self::Nasdaq => 3,
        }
    }

    /// Returns the exchange name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Nyse => "NYSE",
            Self::Amex => "AMEX",
            Self::Nasdaq => "NASDAQ",
        }
    }

    /// Parse an exchange from its CRSP code.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Nyse),
            2 => Some(Self::Amex),
            3 => Some(Self::Nasdaq),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Exchange {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::Config(format!("unknown exchange: {}", s)))
    }
}
