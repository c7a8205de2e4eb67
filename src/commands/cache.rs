use super::{locale, CacheAction};
use smart_agenda::components::AppContext;
use smart_agenda::error::{validation_error, AgendaResult};
use smart_agenda::utils::time::{retention_cutoff, today_in};

/// Cache maintenance works offline, straight on the configured store
pub async fn run(ctx: &AppContext, action: CacheAction) -> AgendaResult<()> {
    let locale = locale(ctx).await;

    match action {
        CacheAction::Clear => {
            ctx.cache.clear().await?;
            println!("{}", t!("cli.cache_cleared", locale = locale));
        }
        CacheAction::Prune { days } => {
            let (retention, tz) = {
                let config = ctx.config.read().await;
                (days.unwrap_or(config.cache_retention_days), config.tz()?)
            };
            let cutoff = retention_cutoff(today_in(&tz), retention).ok_or_else(|| {
                validation_error(&format!("Invalid retention of {} days", retention))
            })?;
            let removed = ctx.cache.delete_older_than(cutoff).await?;
            println!(
                "{}",
                t!("cli.cache_pruned", locale = locale, count = removed, cutoff = cutoff)
            );
        }
    }
    Ok(())
}
