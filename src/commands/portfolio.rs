use crate::args::PortfolioArgs;
use crate::commands::Out;
use crate::portfolio::{self, PortfolioReport};
use crate::{Config, Result};

/// Replays the recorded trades into per-symbol positions and prints them.
///
/// Pass `--symbol` to restrict the replay to one symbol. The symbol is
/// matched case-insensitively because trades are stored uppercased.
pub async fn portfolio(config: Config, args: PortfolioArgs) -> Result<Out<PortfolioReport>> {
    let symbol = args.symbol.map(|s| s.trim().to_uppercase());
    let trades = config.db().list_trades(symbol.as_deref()).await?;
    if trades.is_empty() {
        return Ok("No trades recorded".into());
    }

    let report = portfolio::replay(&trades);
    let message = report.table()?;
    Ok(Out::new(message, report))
}
