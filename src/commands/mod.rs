use crate::startup::{self, Services};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use smart_agenda::components::agenda::{self, AgendaHandle};
use smart_agenda::components::AppContext;
use smart_agenda::config::MAX_CACHE_RETENTION_DAYS;
use smart_agenda::error::{AgendaResult, Error};

// Export submodules
pub mod agenda_view;
pub mod cache;
pub mod event;
pub mod setup;

/// SmartAgenda: daily agenda client for a personal SmartAgenda server
#[derive(Parser, Debug)]
#[command(name = "smart-agenda")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
pub enum Command {
    /// Run the daemon with the daily sync (default behavior)
    #[default]
    Run,
    /// Save the server URL and credential after a successful login
    Setup {
        /// Server URL, e.g. http://192.168.1.10:8086
        #[arg(long)]
        url: String,
        /// Server password (at least 8 characters)
        #[arg(long)]
        password: String,
        /// Daily notification time (HH:MM)
        #[arg(long, default_value = "07:00")]
        time: String,
    },
    /// Check that a server answers
    TestConnection {
        /// Server URL to probe
        #[arg(long)]
        url: String,
    },
    /// Show the summary of a day
    Today {
        /// Day to show (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List upcoming events
    Upcoming,
    /// List notifications pending on the server
    Notifications,
    /// Create, update or delete events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Manage the local event cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Run the daily sync once, right now
    SyncNow,
}

#[derive(Subcommand, Debug)]
pub enum EventAction {
    /// Create an event
    Add {
        #[command(flatten)]
        fields: EventFields,
    },
    /// Replace an existing event
    Update {
        /// Event ID
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EventFields {
    /// Event title
    #[arg(long)]
    pub title: String,
    /// Day of the event (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Time of day (HH:MM), all-day when omitted
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, default_value = "")]
    pub category: String,
    /// Repeats, see --pattern
    #[arg(long)]
    pub recurring: bool,
    /// Recurrence pattern, e.g. weekly
    #[arg(long)]
    pub pattern: Option<String>,
    /// Reminder before the event, e.g. 15min
    #[arg(long)]
    pub reminder: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove every cached event
    Clear,
    /// Remove cached events older than the retention window
    Prune {
        /// Retention in days, CACHE_RETENTION_DAYS when omitted
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_CACHE_RETENTION_DAYS))]
        days: Option<i64>,
    },
}

/// Route a parsed command to its handler
pub async fn dispatch(command: Command, services: Services) -> miette::Result<()> {
    let result = match command {
        Command::Run => return startup::start_daemon(services).await,
        Command::Setup {
            url,
            password,
            time,
        } => setup::setup(&services.context, &url, &password, &time).await,
        Command::TestConnection { url } => setup::test_connection(&services.context, &url).await,
        Command::Today { date, json } => agenda_view::today(&services.context, date, json).await,
        Command::Upcoming => agenda_view::upcoming(&services.context).await,
        Command::Notifications => agenda_view::notifications(&services.context).await,
        Command::Event { action } => event::run(&services.context, action).await,
        Command::Cache { action } => cache::run(&services.context, action).await,
        Command::SyncNow => agenda_view::sync_now(&services.context).await,
    };

    services.close().await;
    result.map_err(Into::into)
}

/// Agenda handle for one-shot commands; fails when setup has not run
pub async fn connect(ctx: &AppContext) -> AgendaResult<AgendaHandle> {
    if !ctx.preferences.is_configured().await {
        return Err(Error::Config(
            "SmartAgenda is not configured, run `smart-agenda setup` first".to_string(),
        ));
    }
    agenda::connect(ctx).await
}

/// Locale from the shared config
pub async fn locale(ctx: &AppContext) -> String {
    ctx.config.read().await.locale.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_days_are_bounded() {
        let parsed = Cli::try_parse_from(["smart-agenda", "cache", "prune", "--days", "7"]).unwrap();
        assert!(matches!(
            parsed.command,
            Some(Command::Cache {
                action: CacheAction::Prune { days: Some(7) }
            })
        ));

        assert!(Cli::try_parse_from(["smart-agenda", "cache", "prune", "--days=-5"]).is_err());
        assert!(Cli::try_parse_from(["smart-agenda", "cache", "prune", "--days=99999"]).is_err());
    }
}
