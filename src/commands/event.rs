use super::{connect, locale, EventAction, EventFields};
use smart_agenda::components::agenda::Event;
use smart_agenda::components::AppContext;
use smart_agenda::error::{validation_error, AgendaResult};
use smart_agenda::utils::time::parse_time;
use uuid::Uuid;

pub async fn run(ctx: &AppContext, action: EventAction) -> AgendaResult<()> {
    let locale = locale(ctx).await;
    let handle = connect(ctx).await?;

    let result = match action {
        EventAction::Add { fields } => {
            let event = into_event(Uuid::new_v4().to_string(), fields)?;
            let id = event.id.clone();
            handle.create_event(event).await.map(|()| {
                println!("{}", t!("cli.event_created", locale = locale, id = id));
            })
        }
        EventAction::Update { id, fields } => {
            let event = into_event(id.clone(), fields)?;
            handle.update_event(event).await.map(|()| {
                println!("{}", t!("cli.event_updated", locale = locale, id = id));
            })
        }
        EventAction::Delete { id } => handle.delete_event(&id).await.map(|()| {
            println!("{}", t!("cli.event_deleted", locale = locale, id = id));
        }),
    };

    handle.shutdown().await?;
    result
}

fn into_event(id: String, fields: EventFields) -> AgendaResult<Event> {
    if fields.title.trim().is_empty() {
        return Err(validation_error("Event title must not be empty"));
    }

    let mut event = Event::new(id, fields.title.trim(), fields.date);
    if let Some(time) = fields.time {
        let (hour, minute) = parse_time(&time)
            .ok_or_else(|| validation_error(&format!("Invalid time '{}', expected HH:MM", time)))?;
        event = event.at(format!("{:02}:{:02}", hour, minute));
    }
    event.description = fields.description;
    event.category = fields.category;
    event.recurring = fields.recurring || fields.pattern.is_some();
    event.recurring_pattern = fields.pattern;
    event.reminder = fields.reminder;
    event.start_date = Some(fields.date);
    Ok(event)
}
