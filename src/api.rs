// REST client for the travel backend.
// Every call issues exactly one request; failures are surfaced to the caller as-is and
// never retried.

use crate::auth::{AuthSession, Credentials, LoginResponse, OtpVerification, Registration};
use crate::catalog::{
    flatten_flights, BookableKind, Booking, BookingItem, Destination, EntityKind, Flight, Hotel,
    Package, Review, User,
};
use crate::checkout::BookingRequest;
use crate::forms::{ContactMessage, ValidationError};
use crate::payload::{
    WireBooking, WireDestination, WireFlight, WireFlightList, WireHotel, WireLogin, WireMessage,
    WirePackage, WireReview, WireSearchResults, WireTokenRefresh,
};
use crate::reviews::ReviewDraft;
use crate::search::{SearchQuery, SearchResults};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const API_URL_ENV: &str = "TRAVEL_API_URL";
pub const API_TIMEOUT_ENV: &str = "TRAVEL_API_TIMEOUT_MS";
pub const WEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";

// Error types for API calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("401: {0}")]
    Unauthorized(String),

    #[error("{status_code}: {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Unexpected response body: {0}")]
    DecodeError(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub weather_base_url: String,
    pub weather_api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_ms: 10_000,
            user_agent: concat!("travel_booking_client/", env!("CARGO_PKG_VERSION")).to_string(),
            weather_base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_api_key: None,
        }
    }
}

impl ClientConfig {
    // Environment overrides win over the built-in defaults
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(url) = env_value(API_URL_ENV) {
            config.base_url = url;
        }
        if let Some(raw) = env_value(API_TIMEOUT_ENV) {
            config.timeout_ms = raw.parse().map_err(|_| {
                ClientError::ConfigError(format!("{} is not a number: {:?}", API_TIMEOUT_ENV, raw))
            })?;
        }
        config.weather_api_key = env_value(WEATHER_KEY_ENV);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    // Joins the base URL and a path with exactly one slash between them
    pub fn api_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Server-side narrowing for the flights listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightQuery {
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub flight_class: Option<String>,
}

impl FlightQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = &self.from_city {
            params.push(("from_city", from.clone()));
        }
        if let Some(to) = &self.to_city {
            params.push(("to_city", to.clone()));
        }
        if let Some(date) = &self.departure_date {
            params.push(("departure_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(class) = &self.flight_class {
            params.push(("flight_class", class.clone()));
        }
        params
    }
}

// Backend operations used by the client
#[async_trait]
pub trait TravelApi: Send + Sync + 'static {
    async fn list_packages(&self) -> Result<Vec<Package>, ApiError>;
    async fn get_package(&self, id: u64) -> Result<Package, ApiError>;

    async fn list_hotels(&self) -> Result<Vec<Hotel>, ApiError>;
    async fn get_hotel(&self, id: u64) -> Result<Hotel, ApiError>;

    async fn list_destinations(&self) -> Result<Vec<Destination>, ApiError>;
    async fn get_destination(&self, id: u64) -> Result<Destination, ApiError>;

    async fn list_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>, ApiError>;
    async fn get_flight(&self, id: u64) -> Result<Flight, ApiError>;

    // Global search across hotels, packages, destinations and flights
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, ApiError>;

    async fn list_reviews(&self, kind: EntityKind, id: u64) -> Result<Vec<Review>, ApiError>;
    async fn create_review(
        &self,
        kind: EntityKind,
        id: u64,
        draft: &ReviewDraft,
    ) -> Result<Review, ApiError>;
    async fn delete_review(&self, kind: EntityKind, review_id: u64) -> Result<(), ApiError>;

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError>;
    async fn user_bookings(&self, user_id: u64) -> Result<Vec<Booking>, ApiError>;

    async fn send_contact(&self, message: &ContactMessage) -> Result<(), ApiError>;

    // Both return the server's confirmation message
    async fn register(&self, registration: &Registration) -> Result<String, ApiError>;
    async fn verify_otp(&self, verification: &OtpVerification) -> Result<String, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError>;

    // Loads the purchasable item behind a checkout selection
    async fn get_booking_item(&self, kind: BookableKind, id: u64) -> Result<BookingItem, ApiError> {
        let item = match kind {
            BookableKind::Package => BookingItem::from(&self.get_package(id).await?),
            BookableKind::Flight => BookingItem::from(&self.get_flight(id).await?),
            BookableKind::Hotel => BookingItem::from(&self.get_hotel(id).await?),
        };
        Ok(item)
    }
}

// Maps a non-2xx status to the error shown to the user: "{status}: {body or reason}"
pub fn status_error(status_code: u16, body: &str, reason: Option<&str>) -> ApiError {
    let message = if body.trim().is_empty() {
        reason.unwrap_or("Unknown error").to_string()
    } else {
        body.trim().to_string()
    };
    if status_code == 401 {
        ApiError::Unauthorized(message)
    } else {
        ApiError::ApiResponseError {
            status_code,
            message,
        }
    }
}

// HTTP implementation backed by reqwest
pub struct HttpTravelApi {
    http: reqwest::Client,
    config: ClientConfig,
    session: AuthSession,
}

impl HttpTravelApi {
    pub fn new(config: ClientConfig, session: AuthSession) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else if err.is_decode() {
            ApiError::DecodeError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        debug!(method, path, "sending request");
        let response = request.send().await.map_err(|e| {
            let error = self.transport_error(e);
            warn!(method, path, error = %error, "request failed");
            error
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = status_error(status.as_u16(), &body, status.canonical_reason());
        if let ApiError::Unauthorized(message) = &error {
            if message.contains("token") {
                self.session.clear_access_token();
            }
        }
        warn!(method, path, status = status.as_u16(), "request rejected");
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::DecodeError(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.http.get(self.config.api_path(path)).query(query);
        let response = self.execute(request, "GET", path).await?;
        Self::decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.config.api_path(path)).json(body);
        let response = self.execute(request, "POST", path).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl TravelApi for HttpTravelApi {
    async fn list_packages(&self) -> Result<Vec<Package>, ApiError> {
        let wire: Vec<WirePackage> = self.get_json("/packages/", &[]).await?;
        Ok(wire.into_iter().map(Package::from).collect())
    }

    async fn get_package(&self, id: u64) -> Result<Package, ApiError> {
        let wire: WirePackage = self.get_json(&format!("/packages/{}/", id), &[]).await?;
        Ok(wire.into())
    }

    async fn list_hotels(&self) -> Result<Vec<Hotel>, ApiError> {
        let wire: Vec<WireHotel> = self.get_json("/hotels/", &[]).await?;
        Ok(wire.into_iter().map(Hotel::from).collect())
    }

    async fn get_hotel(&self, id: u64) -> Result<Hotel, ApiError> {
        let wire: WireHotel = self.get_json(&format!("/hotels/{}/", id), &[]).await?;
        Ok(wire.into())
    }

    async fn list_destinations(&self) -> Result<Vec<Destination>, ApiError> {
        let wire: Vec<WireDestination> = self.get_json("/destinations/", &[]).await?;
        Ok(wire.into_iter().map(Destination::from).collect())
    }

    async fn get_destination(&self, id: u64) -> Result<Destination, ApiError> {
        let wire: WireDestination = self.get_json(&format!("/destinations/{}/", id), &[]).await?;
        Ok(wire.into())
    }

    async fn list_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>, ApiError> {
        let wire: WireFlightList = self.get_json("/flights/", &query.to_params()).await?;
        Ok(flatten_flights(wire))
    }

    async fn get_flight(&self, id: u64) -> Result<Flight, ApiError> {
        let wire: WireFlight = self.get_json(&format!("/flights/{}/", id), &[]).await?;
        Ok(wire.into())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, ApiError> {
        let wire: WireSearchResults = self
            .get_json("/search/", &[("q", query.as_str().to_string())])
            .await?;
        Ok(wire.into())
    }

    async fn list_reviews(&self, kind: EntityKind, id: u64) -> Result<Vec<Review>, ApiError> {
        let path = format!("/{}/{}/reviews/", kind.collection(), id);
        let wire: Vec<WireReview> = self.get_json(&path, &[]).await?;
        Ok(wire.into_iter().map(Review::from).collect())
    }

    async fn create_review(
        &self,
        kind: EntityKind,
        id: u64,
        draft: &ReviewDraft,
    ) -> Result<Review, ApiError> {
        let path = format!("/{}/{}/reviews/", kind.collection(), id);
        let wire: WireReview = self.post_json(&path, draft).await?;
        Ok(wire.into())
    }

    async fn delete_review(&self, kind: EntityKind, review_id: u64) -> Result<(), ApiError> {
        let path = format!("/{}/reviews/{}/", kind.collection(), review_id);
        let request = self.http.delete(self.config.api_path(&path));
        self.execute(request, "DELETE", &path).await?;
        Ok(())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        let wire: WireBooking = self.post_json("/bookings/", request).await?;
        Ok(wire.into())
    }

    async fn user_bookings(&self, user_id: u64) -> Result<Vec<Booking>, ApiError> {
        let path = format!("/users/{}/bookings", user_id);
        let wire: Vec<WireBooking> = self.get_json(&path, &[]).await?;
        Ok(wire.into_iter().map(Booking::from).collect())
    }

    async fn send_contact(&self, message: &ContactMessage) -> Result<(), ApiError> {
        let request = self.http.post(self.config.api_path("/contact")).json(message);
        self.execute(request, "POST", "/contact").await?;
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        registration.validate()?;
        let wire: WireMessage = self.post_json("/users/register", registration).await?;
        Ok(wire.message)
    }

    async fn verify_otp(&self, verification: &OtpVerification) -> Result<String, ApiError> {
        let wire: WireMessage = self.post_json("/users/verify-otp", verification).await?;
        Ok(wire.message)
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let wire: WireLogin = self.post_json("/users/login", credentials).await?;
        Ok(LoginResponse {
            user: User::from(wire.user),
            access: wire.access,
            refresh: wire.refresh,
        })
    }

    async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let wire: WireTokenRefresh = self
            .post_json("/token/refresh/", &json!({ "refresh": refresh }))
            .await?;
        Ok(wire.access)
    }
}


#[cfg(test)]
mod tests {
    use super::mock_server::MockTravelApi;
    use super::*;
    use crate::auth::SessionState;
    use crate::catalog::Package;

    #[test]
    fn test_api_path_joins_with_single_slash() {
        let mut config = ClientConfig::default();
        assert_eq!(
            config.api_path("/packages/"),
            "http://localhost:8000/api/packages/"
        );
        config.base_url = "https://travel.example.com/api/".to_string();
        assert_eq!(
            config.api_path("search/"),
            "https://travel.example.com/api/search/"
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ClientConfig::default().validate().is_ok());

        let config = ClientConfig {
            base_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::ConfigError(_))));

        let config = ClientConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_error_messages() {
        let error = status_error(500, "", Some("Internal Server Error"));
        assert_eq!(error.to_string(), "500: Internal Server Error");

        let error = status_error(400, "{\"email\": [\"required\"]}", Some("Bad Request"));
        assert_eq!(error.to_string(), "400: {\"email\": [\"required\"]}");

        let error = status_error(401, "token_not_valid", Some("Unauthorized"));
        assert_eq!(error, ApiError::Unauthorized("token_not_valid".to_string()));
        assert_eq!(error.to_string(), "401: token_not_valid");
    }

    #[test]
    fn test_flight_query_params() {
        let query = FlightQuery {
            from_city: Some("Delhi".to_string()),
            departure_date: NaiveDate::from_ymd_opt(2025, 6, 11),
            ..Default::default()
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("from_city", "Delhi".to_string()),
                ("departure_date", "2025-06-11".to_string())
            ]
        );
        assert!(FlightQuery::default().to_params().is_empty());
    }

    #[test]
    fn test_http_client_builds_from_config() {
        let api = HttpTravelApi::new(ClientConfig::default(), AuthSession::new());
        assert!(api.is_ok());

        let bad = ClientConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(HttpTravelApi::new(bad, AuthSession::new()).is_err());
    }

    // Serves one canned HTTP/1.1 response and hands back the raw request it received
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (base_url, handle)
    }

    fn signed_in_client(base_url: String) -> HttpTravelApi {
        let session = AuthSession::restore(SessionState {
            user: None,
            access_token: Some("stale-access".to_string()),
            refresh_token: Some("refresh-1".to_string()),
        });
        let config = ClientConfig {
            base_url,
            timeout_ms: 2_000,
            ..Default::default()
        };
        HttpTravelApi::new(config, session).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_token_is_cleared_from_session() {
        let (base_url, server) = serve_once(
            "401 Unauthorized",
            r#"{"detail":"Given token not valid","code":"token_not_valid"}"#,
        )
        .await;
        let api = signed_in_client(base_url);

        let result = api.list_hotels().await;
        assert!(matches!(result, Err(ApiError::Unauthorized(ref m)) if m.contains("token_not_valid")));
        assert_eq!(api.session().access_token(), None);
        assert_eq!(api.session().refresh_token().as_deref(), Some("refresh-1"));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/hotels/ http/1.1"));
        assert!(request.contains("authorization: bearer stale-access"));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let (base_url, server) =
            serve_once("500 Internal Server Error", r#"{"error":"database down"}"#).await;
        let api = signed_in_client(base_url);

        let error = api.get_hotel(7).await.unwrap_err();
        assert_eq!(error.to_string(), r#"500: {"error":"database down"}"#);
        assert_eq!(api.session().access_token().as_deref(), Some("stale-access"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let (base_url, server) = serve_once("200 OK", "[{\"id\": ").await;
        let api = signed_in_client(base_url);

        let result = api.list_destinations().await;
        assert!(matches!(result, Err(ApiError::DecodeError(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_booking_item_by_kind() {
        let api = MockTravelApi::new();
        api.packages.lock().push(Package {
            id: 3,
            name: "Rajasthan Royal Tour".to_string(),
            category: "Cultural".to_string(),
            duration_days: Some(6),
            inclusions: vec!["Heritage hotels".to_string()],
            price: "32999.00".to_string(),
            description: String::new(),
            photo: None,
            reviews: vec![],
        });

        let item = api.get_booking_item(BookableKind::Package, 3).await.unwrap();
        assert_eq!(item.name, "Rajasthan Royal Tour");
        assert_eq!(item.unit_price, "32999.00");

        let missing = api.get_booking_item(BookableKind::Hotel, 3).await;
        assert!(matches!(
            missing,
            Err(ApiError::ApiResponseError {
                status_code: 404,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_reviews_round_trip_through_backend() {
        let api = MockTravelApi::new();
        let draft = ReviewDraft::new(4, "Great views").unwrap();

        let created = api
            .create_review(EntityKind::Destination, 2, &draft)
            .await
            .unwrap();
        let listed = api.list_reviews(EntityKind::Destination, 2).await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        api.delete_review(EntityKind::Destination, created.id)
            .await
            .unwrap();
        assert!(api
            .list_reviews(EntityKind::Destination, 2)
            .await
            .unwrap()
            .is_empty());
    }
}
