use crate::config::Config;
use crate::error::ApiError;
use crate::model::*;
use crate::session::Session;
use actix_web::client::Client;
use actix_web::http::{header, Method};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Raises awc's default body limit, the full movie list does not fit in it.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

fn log_error(err: ApiError) -> ApiError {
    error!("{}", err);
    err
}

/// An empty or `null` body reads as `{}`.
fn normalize(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice(body) {
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(value) => Ok(value),
        Err(err) => Err(log_error(ApiError::Decode(err.to_string()))),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| log_error(ApiError::Decode(err.to_string())))
}

fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    match value {
        Value::Object(ref map) if map.is_empty() => Ok(Vec::new()),
        value => decode(value),
    }
}

fn confirmation(body: &[u8]) -> String {
    match serde_json::from_slice(body) {
        Ok(Value::String(message)) => message,
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| log_error(ApiError::Decode(err.to_string())))
}

fn username(session: &Session) -> Result<&str, ApiError> {
    session
        .username
        .as_deref()
        .ok_or_else(|| log_error(ApiError::Unauthenticated))
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    require_token: bool,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        ApiClient {
            http: Client::default(),
            base_url,
            require_token: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ApiClient::new(config.api_url.clone()).require_token(config.require_token)
    }

    /// With `true`, authenticated calls on a session without a token fail up
    /// front instead of going out with no Authorization header.
    pub fn require_token(mut self, require_token: bool) -> Self {
        self.require_token = require_token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        // The url crate drops dot segments, which would silently hit another endpoint.
        if let Some(segment) = segments.iter().find(|s| **s == "." || **s == "..") {
            return Err(log_error(ApiError::InvalidPath(segment.to_string())));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| log_error(ApiError::Network(format!("{} cannot be a base", self.base_url))))?
            .pop_if_empty()
            .extend(segments.iter());
        Ok(url)
    }

    fn token<'a>(&self, session: &'a Session) -> Result<Option<&'a str>, ApiError> {
        match session.token.as_deref() {
            Some(token) => Ok(Some(token)),
            None if self.require_token => Err(log_error(ApiError::Unauthenticated)),
            None => {
                warn!("No token in session, sending request without authorization");
                Ok(None)
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Vec<u8>, ApiError> {
        debug!("{} {}", method, url);
        let mut request = self.http.request(method, url.as_str());
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let sent = match body {
            Some(body) => request.send_json(&body).await,
            None => request.send().await,
        };
        let mut response = sent.map_err(|err| log_error(ApiError::Network(err.to_string())))?;
        let status = response.status();
        let payload = response.body().limit(BODY_LIMIT).await;
        if !status.is_success() {
            let body = match payload {
                Ok(payload) => String::from_utf8_lossy(&payload).into_owned(),
                Err(err) => {
                    warn!("Could not read error body: {}", err);
                    String::new()
                }
            };
            return Err(log_error(ApiError::from_status(status.as_u16(), body)));
        }
        let payload = payload.map_err(|err| log_error(ApiError::Network(err.to_string())))?;
        Ok(payload.to_vec())
    }

    async fn anonymous(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(segments)?;
        normalize(&self.send(method, url, None, body).await?)
    }

    async fn authorized_raw(
        &self,
        method: Method,
        session: &Session,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let token = self.token(session)?;
        let url = self.endpoint(segments)?;
        self.send(method, url, token, body).await
    }

    async fn authorized(
        &self,
        method: Method,
        session: &Session,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        normalize(&self.authorized_raw(method, session, segments, body).await?)
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let body = encode(registration)?;
        decode(self.anonymous(Method::POST, &["users"], Some(body)).await?)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = encode(credentials)?;
        decode(self.anonymous(Method::POST, &["login"], Some(body)).await?)
    }

    pub async fn list_movies(&self, session: &Session) -> Result<Vec<Movie>, ApiError> {
        decode_list(self.authorized(Method::GET, session, &["movies"], None).await?)
    }

    pub async fn get_movie(&self, session: &Session, title: &str) -> Result<Movie, ApiError> {
        decode(
            self.authorized(Method::GET, session, &["movies", title], None)
                .await?,
        )
    }

    pub async fn get_director(&self, session: &Session, name: &str) -> Result<Director, ApiError> {
        decode(
            self.authorized(Method::GET, session, &["movies", "director", name], None)
                .await?,
        )
    }

    pub async fn get_genre(&self, session: &Session, name: &str) -> Result<Genre, ApiError> {
        decode(
            self.authorized(Method::GET, session, &["movies", "genre", name], None)
                .await?,
        )
    }

    pub async fn get_profile(&self, session: &Session) -> Result<User, ApiError> {
        let username = username(session)?;
        decode(
            self.authorized(Method::GET, session, &["users", username], None)
                .await?,
        )
    }

    pub async fn list_favorites(&self, session: &Session) -> Result<Vec<String>, ApiError> {
        let username = username(session)?;
        decode_list(
            self.authorized(Method::GET, session, &["users", username, "movies"], None)
                .await?,
        )
    }

    pub async fn add_favorite(&self, session: &Session, movie_id: &str) -> Result<User, ApiError> {
        let username = username(session)?;
        let segments = ["users", username, "movies", movie_id];
        decode(self.authorized(Method::POST, session, &segments, None).await?)
    }

    pub async fn remove_favorite(
        &self,
        session: &Session,
        movie_id: &str,
    ) -> Result<User, ApiError> {
        let username = username(session)?;
        let segments = ["users", username, "favoritemovies", movie_id];
        decode(self.authorized(Method::DELETE, session, &segments, None).await?)
    }

    pub async fn edit_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let username = username(session)?;
        let body = encode(update)?;
        decode(
            self.authorized(Method::PUT, session, &["users", username], Some(body))
                .await?,
        )
    }

    /// Returns the confirmation the service sends back, which may be plain text.
    pub async fn delete_profile(&self, session: &Session) -> Result<String, ApiError> {
        let username = username(session)?;
        let payload = self
            .authorized_raw(Method::DELETE, session, &["users", username], None)
            .await?;
        Ok(confirmation(&payload))
    }
}

/// Stub remote service for tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use actix_web::{test, web, App, HttpRequest, HttpResponse};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub struct Recorded {
        pub method: String,
        pub path: String,
        pub authorization: Option<String>,
        pub body: String,
    }

    pub type Requests = Arc<Mutex<Vec<Recorded>>>;

    /// Answers every request with `status` and `body`, remembering what it saw.
    pub fn stub(status: u16, body: &'static str) -> (test::TestServer, Requests) {
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let srv = test::start(move || {
            App::new().data(seen.clone()).default_service(web::route().to(
                move |req: HttpRequest, payload: String, seen: web::Data<Requests>| {
                    seen.lock().unwrap().push(Recorded {
                        method: req.method().to_string(),
                        path: req.uri().path().to_owned(),
                        authorization: req
                            .headers()
                            .get(header::AUTHORIZATION)
                            .and_then(|value| value.to_str().ok())
                            .map(str::to_owned),
                        body: payload,
                    });
                    let status = actix_web::http::StatusCode::from_u16(status).unwrap();
                    async move {
                        HttpResponse::build(status)
                            .content_type("application/json")
                            .body(body)
                    }
                },
            ))
        });
        (srv, requests)
    }

    pub fn client_for(srv: &test::TestServer) -> ApiClient {
        ApiClient::new(Url::parse(&srv.url("/")).unwrap())
    }
}
