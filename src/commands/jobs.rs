use crate::args::{EmailArgs, JobsAddArgs, JobsIdArgs};
use crate::commands::{backup, email, Out};
use crate::mail::Mode;
use crate::model::{Job, JobKind};
use crate::{utils, Config, Result};
use anyhow::bail;
use chrono::NaiveDate;
use tracing::error;

/// Registers a recurring monthly job. The job fires on the first `run-due`
/// pass on or after its scheduled day each month.
pub async fn jobs_add(config: Config, args: JobsAddArgs) -> Result<Out<Job>> {
    let id = config.db().insert_job(args.kind, args.day).await?;
    let job = Job {
        job_id: id,
        kind: args.kind,
        day_of_month: args.day,
        last_run: None,
        enabled: true,
    };
    let message = format!("Added job {id}: {} on day {} of each month", args.kind, args.day);
    Ok(Out::new(message, job))
}

pub async fn jobs_list(config: Config) -> Result<Out<Vec<Job>>> {
    let jobs = config.db().list_jobs().await?;
    if jobs.is_empty() {
        return Ok("No jobs registered".into());
    }

    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|j| {
            vec![
                j.job_id.to_string(),
                j.kind.to_string(),
                j.day_of_month.to_string(),
                j.last_run.map(|d| d.to_string()).unwrap_or_default(),
                if j.enabled { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    let table = utils::render_table(&["ID", "Kind", "Day", "Last run", "Enabled"], &rows)?;

    let count = jobs.len();
    let message = format!(
        "{count} job{}\n\n{table}",
        if count == 1 { "" } else { "s" }
    );
    Ok(Out::new(message, jobs))
}

pub async fn jobs_remove(config: Config, args: JobsIdArgs) -> Result<Out<()>> {
    config.db().delete_job(args.id).await?;
    Ok(format!("Removed job {}", args.id).into())
}

pub async fn jobs_enable(config: Config, args: JobsIdArgs) -> Result<Out<()>> {
    set_enabled(config, args.id, true).await
}

pub async fn jobs_disable(config: Config, args: JobsIdArgs) -> Result<Out<()>> {
    set_enabled(config, args.id, false).await
}

async fn set_enabled(config: Config, id: i64, enabled: bool) -> Result<Out<()>> {
    let Some(mut job) = config.db().get_job(id).await? else {
        bail!("No job found with ID {id}");
    };
    job.enabled = enabled;
    config.db().update_job(&job).await?;
    let verb = if enabled { "Enabled" } else { "Disabled" };
    Ok(format!("{verb} job {id}").into())
}

/// Runs every registered job that is due today and stamps `last_run` on the
/// ones that succeed.
///
/// A failed job is logged and left unstamped so the next pass retries it;
/// the remaining jobs still run. Intended to be invoked daily by cron.
pub async fn jobs_run_due(config: Config, mode: Mode) -> Result<Out<Vec<Job>>> {
    let today = utils::today();
    let due: Vec<Job> = config
        .db()
        .list_jobs()
        .await?
        .into_iter()
        .filter(|job| job.is_due(today))
        .collect();

    let mut ran: Vec<Job> = Vec::new();
    for mut job in due {
        if let Err(e) = run_job(&config, &job, mode, today).await {
            error!("Job {} ({}) failed: {e:#}", job.job_id, job.kind);
            continue;
        }
        job.last_run = Some(today);
        config.db().update_job(&job).await?;
        ran.push(job);
    }

    let count = ran.len();
    let message = format!("{count} job{} ran", if count == 1 { "" } else { "s" });
    Ok(Out::new(message, ran))
}

async fn run_job(config: &Config, job: &Job, mode: Mode, today: NaiveDate) -> Result<()> {
    match job.kind {
        JobKind::EmailSummary => {
            let month = utils::month_key(utils::previous_month(today)?);
            let args = EmailArgs { month: Some(month) };
            email(config.clone(), args, mode).await?;
        }
        JobKind::Backup => {
            backup(config.clone()).await?;
        }
    }
    Ok(())
}
