//! Weighted-average-cost bookkeeping over the trade log.
//!
//! Positions are never stored. They are rebuilt on demand by replaying a
//! symbol's trades in date order (ties broken by insertion order), which
//! keeps the trade log the single source of truth.

use crate::model::{Amount, Trade, TradeSide};
use crate::{utils, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One symbol's running position while replaying its trades.
#[derive(Default, Debug, Clone, Serialize)]
pub struct Position {
    pub(crate) symbol: String,
    /// Units currently held. Never negative.
    pub(crate) quantity: Decimal,
    /// Total cost of the held units, buy fees included. Exactly zero when
    /// the position is closed.
    pub(crate) cost_basis: Decimal,
    /// Profit and loss locked in by sells, net of sell fees.
    pub(crate) realized: Decimal,
}

impl Position {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    /// The average cost per held unit, zero when nothing is held.
    pub(crate) fn avg_cost(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.cost_basis / self.quantity
        }
    }

    /// Folds one trade into the position.
    ///
    /// A sell is clamped to the held quantity: selling more than is held
    /// realizes only the held part, and the held quantity never goes
    /// negative. Sell fees hit realized P&L in full either way.
    fn apply(&mut self, trade: &Trade) {
        match trade.side {
            TradeSide::Buy => {
                self.cost_basis += trade.quantity * trade.price + trade.fees;
                self.quantity += trade.quantity;
            }
            TradeSide::Sell => {
                let sold = trade.quantity.min(self.quantity);
                let avg = self.avg_cost();
                self.realized += sold * trade.price - sold * avg - trade.fees;
                self.cost_basis -= sold * avg;
                self.quantity -= sold;
                if self.quantity.is_zero() {
                    // Division residue must not survive a closed position.
                    self.cost_basis = Decimal::ZERO;
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.quantity.is_zero() && self.realized.is_zero()
    }
}

/// The portfolio rollup: one row per symbol plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub(crate) positions: Vec<Position>,
    pub(crate) total_cost_basis: Decimal,
    pub(crate) total_realized: Decimal,
}

impl PortfolioReport {
    /// Renders the report as an aligned text table.
    pub fn table(&self) -> Result<String> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for p in &self.positions {
            rows.push(vec![
                p.symbol.clone(),
                p.quantity.normalize().to_string(),
                money(p.avg_cost()),
                money(p.cost_basis),
                money(p.realized),
            ]);
        }
        rows.push(vec![
            "TOTAL".to_string(),
            String::new(),
            String::new(),
            money(self.total_cost_basis),
            money(self.total_realized),
        ]);
        utils::render_table(
            &["Symbol", "Quantity", "Avg Cost", "Cost Basis", "Realized"],
            &rows,
        )
    }
}

/// Replays the trade log and returns the per-symbol positions.
///
/// The input must already be ordered the way `Db::list_trades` returns it.
/// Closed positions with no realized P&L are omitted; symbols come back in
/// alphabetical order.
pub fn replay(trades: &[Trade]) -> PortfolioReport {
    let mut positions: BTreeMap<String, Position> = BTreeMap::new();
    for trade in trades {
        positions
            .entry(trade.symbol.clone())
            .or_insert_with(|| Position::new(&trade.symbol))
            .apply(trade);
    }

    let mut total_cost_basis = Decimal::ZERO;
    let mut total_realized = Decimal::ZERO;
    let positions: Vec<Position> = positions
        .into_values()
        .filter(|p| !p.is_closed())
        .inspect(|p| {
            total_cost_basis += p.cost_basis;
            total_realized += p.realized;
        })
        .collect();

    PortfolioReport {
        positions,
        total_cost_basis,
        total_realized,
    }
}

fn money(value: Decimal) -> String {
    Amount::new(value.round_dp(2)).to_string()
}
