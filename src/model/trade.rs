use crate::Result;
use anyhow::bail;
use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A buy or sell of an investment instrument.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Trade {
    /// The unique, program-generated identifier, e.g. `trd-6ba7b810-...`.
    pub(crate) trade_id: String,
    pub(crate) date: NaiveDate,
    /// The ticker symbol, stored uppercase, e.g. `VTI`.
    pub(crate) symbol: String,
    pub(crate) side: TradeSide,
    /// The number of units traded. Fractional quantities are allowed.
    pub(crate) quantity: Decimal,
    /// The per-unit price paid or received.
    pub(crate) price: Decimal,
    /// Commissions and fees for the trade, if any.
    pub(crate) fees: Decimal,
    pub(crate) note: String,
}

impl Trade {
    /// Checks the field constraints that the database schema cannot express.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("A trade requires a symbol");
        }
        if self.quantity <= Decimal::ZERO {
            bail!("The trade quantity must be greater than zero, got {}", self.quantity);
        }
        if self.price < Decimal::ZERO {
            bail!("The trade price cannot be negative, got {}", self.price);
        }
        if self.fees < Decimal::ZERO {
            bail!("The trade fees cannot be negative, got {}", self.fees);
        }
        Ok(())
    }
}

/// Whether a trade added to or reduced a position.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    #[default]
    Buy,
    Sell,
}

serde_plain::derive_display_from_serialize!(TradeSide);
serde_plain::derive_fromstr_from_deserialize!(TradeSide);
