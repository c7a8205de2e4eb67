use super::locale;
use smart_agenda::components::agenda::setup::{check_server, save_configuration, SetupForm, SetupState};
use smart_agenda::components::agenda::AgendaClient;
use smart_agenda::components::AppContext;
use smart_agenda::error::{validation_error, AgendaResult, Error};
use smart_agenda::utils::time::parse_time;

/// Validate, log in and persist the configuration
pub async fn setup(ctx: &AppContext, url: &str, password: &str, time: &str) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let (hour, minute) = parse_time(time)
        .ok_or_else(|| validation_error(&format!("Invalid time '{}', expected HH:MM", time)))?;

    let timeout = ctx.config.read().await.http_timeout();
    let api = AgendaClient::new(url, timeout)?;
    let form = SetupForm::new(url, password).at(hour, minute);

    println!("{}", t!("setup.authenticating", locale = locale));
    let state = save_configuration(&api, &ctx.preferences, &form, &locale).await;
    report(state)
}

/// Probe a server without saving anything
pub async fn test_connection(ctx: &AppContext, url: &str) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let timeout = ctx.config.read().await.http_timeout();

    println!("{}", t!("setup.testing", locale = locale));
    report(check_server(url, timeout, &locale).await)
}

fn report(state: SetupState) -> AgendaResult<()> {
    match state {
        SetupState::Success(message) => {
            println!("{}", message);
            Ok(())
        }
        SetupState::Error(message) => Err(Error::Validation(message)),
        other => Err(Error::Other(format!("Unexpected setup state {:?}", other))),
    }
}
