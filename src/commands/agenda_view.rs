use super::{connect, locale};
use chrono::NaiveDate;
use smart_agenda::components::agenda::display::{render_events, render_summary};
use smart_agenda::components::agenda::scheduler::RunState;
use smart_agenda::components::agenda::DailySync;
use smart_agenda::components::AppContext;
use smart_agenda::error::{AgendaResult, Error};
use smart_agenda::utils::time::today_in;
use std::sync::Arc;

/// Print the summary of `date`, today by default
pub async fn today(ctx: &AppContext, date: Option<NaiveDate>, json: bool) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let date = match date {
        Some(date) => date,
        None => today_in(&ctx.config.read().await.tz()?),
    };

    let handle = connect(ctx).await?;
    let summary = handle.daily_summary(date).await;
    handle.shutdown().await?;
    let summary = summary?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary, &locale));
    }
    Ok(())
}

pub async fn upcoming(ctx: &AppContext) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let handle = connect(ctx).await?;
    let events = handle.upcoming_events().await;
    handle.shutdown().await?;

    print!("{}", render_events(&events?, &locale));
    Ok(())
}

/// Notifications queued on the server
pub async fn notifications(ctx: &AppContext) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let handle = connect(ctx).await?;
    let items = handle.pending_notifications().await;
    handle.shutdown().await?;
    let items = items?;

    if items.is_empty() {
        println!("{}", t!("cli.no_pending_notifications", locale = locale));
    }
    for item in items {
        println!("• [{}] {} - {} ({})", item.kind, item.title, item.message, item.timestamp);
    }
    Ok(())
}

/// One daily run, without waiting for the schedule
pub async fn sync_now(ctx: &AppContext) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let handle = connect(ctx).await?;
    let sync = {
        let config = ctx.config.read().await;
        DailySync::new(handle.clone(), Arc::clone(&ctx.notifier), &config)?
    };

    let report = sync.run_now().await;
    handle.shutdown().await?;

    match report.state {
        RunState::Success => {
            println!(
                "{}",
                t!(
                    "cli.sync_done",
                    locale = locale,
                    events = report.summary.map(|s| s.total_events()).unwrap_or_default(),
                    pruned = report.pruned
                )
            );
            Ok(())
        }
        state => Err(Error::Other(format!(
            "Sync ended in {:?} after {} attempt(s)",
            state, report.attempts
        ))),
    }
}
