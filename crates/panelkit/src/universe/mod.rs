//! Security universe of the CRSP pulls.
//!
//! The universe decides which CRSP security-months enter the panel through
//! the exchange and share codes of the name history.

pub mod exchange;

pub use exchange::Exchange;

use panelkit_data::wrds::SecurityFilter;

/// Share codes of ordinary common shares of US companies.
pub const US_COMMON_SHARE_CODES: &[i64] = &[10, 11];

/// Trait for security universes.
pub trait Universe {
    /// Short description for logs.
    fn name(&self) -> String;

    /// Filter applied to the CRSP name history.
    fn security_filter(&self) -> SecurityFilter;
}

/// Common stocks listed on a set of exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrspUniverse {
    exchanges: Vec<Exchange>,
    share_codes: Vec<i64>,
}

impl CrspUniverse {
    /// NYSE, AMEX and NASDAQ common stocks.
    pub fn new() -> Self {
        Self {
            exchanges: Exchange::all(),
            share_codes: US_COMMON_SHARE_CODES.to_vec(),
        }
    }

    /// Restrict to `exchanges`.
    pub fn with_exchanges(mut self, exchanges: &[Exchange]) -> Self {
        let mut exchanges = exchanges.to_vec();
        exchanges.sort();
        exchanges.dedup();
        self.exchanges = exchanges;
        self
    }

    /// Accept `share_codes` instead of the common-share codes.
    pub fn with_share_codes(mut self, share_codes: &[i64]) -> Self {
        self.share_codes = share_codes.to_vec();
        self
    }

    /// Exchanges in the universe.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }
}

impl Default for CrspUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe for CrspUniverse {
    fn name(&self) -> String {
        let exchanges: Vec<&str> = self.exchanges.iter().map(|e| e.name()).collect();
        format!("{} shrcd {:?}", exchanges.join("/"), self.share_codes)
    }

    fn security_filter(&self) -> SecurityFilter {
        SecurityFilter {
            exchange_codes: self.exchanges.iter().map(|e| e.code()).collect(),
            share_codes: self.share_codes.clone(),
        }
    }
}
