use super::models::{
    ApiResponse, Event, EventsResponse, HealthResponse, HolidayResponse, LoginRequest, LoginResponse,
    NotificationItem, NotificationsResponse, UvData, UvResponse, VacationResponse, WeatherData,
    WeatherResponse,
};
use crate::error::{AgendaResult, Error};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Endpoints of the SmartAgenda server
#[async_trait]
pub trait AgendaApi: Send + Sync {
    /// Credential check; opens a session on success
    async fn login(&self, password: &str) -> AgendaResult<()>;

    async fn health_check(&self) -> AgendaResult<()>;

    async fn events_for_day(&self, date: NaiveDate) -> AgendaResult<Vec<Event>>;

    async fn upcoming_events(&self) -> AgendaResult<Vec<Event>>;

    async fn uv_today(&self) -> AgendaResult<Option<UvData>>;

    async fn uv_for_date(&self, date: NaiveDate) -> AgendaResult<Option<UvData>>;

    async fn weather_for_date(&self, date: NaiveDate) -> AgendaResult<Option<WeatherData>>;

    async fn holiday_for_date(&self, date: NaiveDate) -> AgendaResult<HolidayResponse>;

    async fn vacation_for_date(&self, date: NaiveDate) -> AgendaResult<VacationResponse>;

    async fn create_event(&self, event: &Event) -> AgendaResult<()>;

    async fn update_event(&self, event: &Event) -> AgendaResult<()>;

    async fn delete_event(&self, id: &str) -> AgendaResult<()>;

    async fn pending_notifications(&self) -> AgendaResult<Vec<NotificationItem>>;
}

/// HTTP implementation of [`AgendaApi`]
#[derive(Debug, Clone)]
pub struct AgendaClient {
    client: Client,
    base_url: Url,
}

impl AgendaClient {
    /// Build a client for `server_url` with the given connect/request ceiling
    pub fn new(server_url: &str, timeout: Duration) -> AgendaResult<Self> {
        let base_url = parse_base_url(server_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AgendaResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> AgendaResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        Ok(self.client.request(method, url))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AgendaResult<T> {
        let response = self.request(Method::GET, path)?.query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_event(&self, method: Method, path: &str, event: &Event) -> AgendaResult<()> {
        let response = self.request(method, path)?.json(event).send().await?;
        let response = check_status(response).await?;
        let body: ApiResponse = response.json().await?;
        if !body.success {
            return Err(Error::Api {
                status: StatusCode::OK.as_u16(),
                message: body
                    .message
                    .unwrap_or_else(|| "Server rejected the request".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AgendaApi for AgendaClient {
    async fn login(&self, password: &str) -> AgendaResult<()> {
        let response = self
            .request(Method::POST, "auth/password")?
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: LoginResponse = response.json().await?;

        if body.success {
            Ok(())
        } else {
            Err(Error::Authentication(
                body.message.unwrap_or_else(|| "Invalid credential".to_string()),
            ))
        }
    }

    /// Any 2xx answer counts as healthy; the body is only read for the log
    async fn health_check(&self) -> AgendaResult<()> {
        let response = self.request(Method::GET, "/")?.send().await?;
        let response = check_status(response).await?;

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<HealthResponse>(&body) {
            Ok(health) => debug!(
                "Server status {} (version {})",
                health.status,
                health.version.as_deref().unwrap_or("unknown")
            ),
            Err(_) => debug!("Server answered the health check"),
        }
        Ok(())
    }

    async fn events_for_day(&self, date: NaiveDate) -> AgendaResult<Vec<Event>> {
        let body: EventsResponse = self
            .get_json("api/events/day", &[("date", date_param(date))])
            .await?;
        Ok(body.events)
    }

    async fn upcoming_events(&self) -> AgendaResult<Vec<Event>> {
        let body: EventsResponse = self.get_json("api/events/upcoming", &[]).await?;
        Ok(body.events)
    }

    async fn uv_today(&self) -> AgendaResult<Option<UvData>> {
        let body: UvResponse = self.get_json("api/uv/today", &[]).await?;
        Ok(body.success.then_some(body.uv_data).flatten())
    }

    async fn uv_for_date(&self, date: NaiveDate) -> AgendaResult<Option<UvData>> {
        let body: UvResponse = self
            .get_json("api/uv/date", &[("date", date_param(date))])
            .await?;
        Ok(body.success.then_some(body.uv_data).flatten())
    }

    async fn weather_for_date(&self, date: NaiveDate) -> AgendaResult<Option<WeatherData>> {
        let body: WeatherResponse = self
            .get_json("api/weather/date", &[("date", date_param(date))])
            .await?;
        Ok(body.into_weather(date))
    }

    async fn holiday_for_date(&self, date: NaiveDate) -> AgendaResult<HolidayResponse> {
        self.get_json("api/feries", &[("date", date_param(date))])
            .await
    }

    async fn vacation_for_date(&self, date: NaiveDate) -> AgendaResult<VacationResponse> {
        self.get_json("api/conges", &[("date", date_param(date))])
            .await
    }

    async fn create_event(&self, event: &Event) -> AgendaResult<()> {
        self.send_event(Method::POST, "api/events", event).await
    }

    async fn update_event(&self, event: &Event) -> AgendaResult<()> {
        let path = format!("api/events/{}", event.id);
        self.send_event(Method::PUT, &path, event).await
    }

    async fn delete_event(&self, id: &str) -> AgendaResult<()> {
        let path = format!("api/events/{}", id);
        let response = self.request(Method::DELETE, &path)?.send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn pending_notifications(&self) -> AgendaResult<Vec<NotificationItem>> {
        let body: NotificationsResponse = self.get_json("api/notifications/pending", &[]).await?;
        if body.count != body.notifications.len() {
            debug!(
                "Server announced {} notifications but sent {}",
                body.count,
                body.notifications.len()
            );
        }
        Ok(body.notifications)
    }
}

/// Parse the server URL into a base that relative endpoints can be joined onto
pub fn parse_base_url(server_url: &str) -> AgendaResult<Url> {
    let mut normalized = server_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|e| Error::Config(format!("Invalid server URL '{}': {}", server_url, e)))
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Turn non-2xx responses into errors, keeping the body for context
async fn check_status(response: Response) -> AgendaResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication(format!("HTTP {} - {}", status, error_body)));
    }

    Err(Error::Api {
        status: status.as_u16(),
        message: error_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serve the same canned response to every request, returning the base URL
    async fn serve(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        content_type,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    /// Consume the headers and the announced body
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }

    async fn client_for(status: &'static str, body: &'static str) -> AgendaClient {
        let url = serve(status, "application/json", body).await;
        AgendaClient::new(&url, Duration::from_secs(5)).unwrap()
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base_without_trailing_slash() {
        let client = AgendaClient::new("http://10.8.0.1:8086", Duration::from_secs(30)).unwrap();
        assert_eq!(
            client.endpoint("api/events/day").unwrap().as_str(),
            "http://10.8.0.1:8086/api/events/day"
        );
        assert_eq!(client.endpoint("/").unwrap().as_str(), "http://10.8.0.1:8086/");
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(parse_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn unauthorized_is_an_authentication_error() {
        let client = client_for("401 Unauthorized", r#"{"error":"login required"}"#).await;
        let result = client.login("wrong-password").await;
        assert!(matches!(result, Err(Error::Authentication(_))));

        let result = client.events_for_day(june_first()).await;
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let client = client_for("500 Internal Server Error", "database locked").await;
        match client.events_for_day(june_first()).await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "database locked");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_serialization_error() {
        let client = client_for("200 OK", "{not json").await;
        let result = client.events_for_day(june_first()).await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn unsuccessful_uv_and_weather_are_absent() {
        let client = client_for("200 OK", r#"{"success":false}"#).await;
        assert!(client.uv_today().await.unwrap().is_none());
        assert!(client.uv_for_date(june_first()).await.unwrap().is_none());
        assert!(client.weather_for_date(june_first()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn health_check_accepts_any_successful_body() {
        let url = serve("200 OK", "text/html", "<html><body>SmartAgenda</body></html>").await;
        let client = AgendaClient::new(&url, Duration::from_secs(5)).unwrap();
        assert!(client.health_check().await.is_ok());

        let client = client_for("200 OK", "").await;
        assert!(client.health_check().await.is_ok());

        let client = client_for("503 Service Unavailable", "").await;
        assert!(client.health_check().await.is_err());
    }
}
