use crate::args::EmailArgs;
use crate::commands::Out;
use crate::db::TransactionFilter;
use crate::mail::{self, Message, Mode};
use crate::{report, utils, Config, Result};

/// Emails one month's dashboard summary to the configured recipient.
///
/// The body is exactly the text `penny dashboard` prints. In `Mode::Http`
/// the mail settings must be filled in and `.secrets/mail_key` present; in
/// `Mode::Test` the message lands in `$PENNY_HOME/outbox/` instead.
pub async fn email(config: Config, args: EmailArgs, mode: Mode) -> Result<Out<()>> {
    let month = args
        .month
        .unwrap_or_else(|| utils::month_key(utils::today()));

    let filter = TransactionFilter {
        month: Some(month.clone()),
        ..Default::default()
    };
    let transactions = config.db().list_transactions(&filter).await?;
    let categories = config.db().list_categories().await?;
    let budgets = config.db().list_budgets(Some(&month)).await?;
    let snapshot = report::month_snapshot(&month, &transactions, &categories, &budgets);

    let to = config.mail().to.clone();
    let message = Message {
        from: config.mail().from.clone(),
        to: to.clone(),
        subject: format!("pennybook summary for {month}"),
        text: snapshot.text()?,
    };
    mail::mailer(&config, mode).await?.send(&message).await?;

    let stamp = format!("{month} {to}");
    config.db().set_property("last_email", &stamp).await?;

    Ok(format!("Sent the {month} summary to {to}").into())
}
