/*
 *     Copyright (C) 2023  Fritz Ochsmann
 *
 *     This program is free software: you can redistribute it and/or modify
 *     it under the terms of the GNU Affero General Public License as published
 *     by the Free Software Foundation, either version 3 of the License, or
 *     (at your option) any later version.
 *
 *     This program is distributed in the hope that it will be useful,
 *     but WITHOUT ANY WARRANTY; without even the implied warranty of
 *     MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *     GNU Affero General Public License for more details.
 *
 *     You should have received a copy of the GNU Affero General Public License
 *     along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use crate::config::Config;
use crate::prelude::{ApplicationState, DatabaseConnection, Role};
use crate::routes::auth::AuthResponse;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::{BoxError, Router};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower::ServiceExt;

/// Drives the router in-process, one request at a time.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    fn request(&self, method: Method, uri: &str) -> RequestBuilder {
        RequestBuilder {
            router: self.router.clone(),
            method,
            uri: uri.to_owned(),
            token: None,
            body: None,
        }
    }

    pub fn get(&self, uri: &str) -> RequestBuilder {
        self.request(Method::GET, uri)
    }

    pub fn post(&self, uri: &str) -> RequestBuilder {
        self.request(Method::POST, uri)
    }

    pub fn put(&self, uri: &str) -> RequestBuilder {
        self.request(Method::PUT, uri)
    }
}

pub struct RequestBuilder {
    router: Router,
    method: Method,
    uri: String,
    token: Option<String>,
    body: Option<(String, &'static str)>,
}

impl RequestBuilder {
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_string(body)
            .ok()
            .map(|body| (body, "application/json"));
        self
    }

    pub fn raw(mut self, body: &str, content_type: &'static str) -> Self {
        self.body = Some((body.to_owned(), content_type));
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    pub async fn send(self) -> Result<TestResponse, BoxError> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match self.body {
            Some((body, content_type)) => builder
                .header(CONTENT_TYPE, content_type)
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.oneshot(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();

        Ok(TestResponse { status, body })
    }
}

pub struct TestResponse {
    status: StatusCode,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Getters)]
#[get = "pub"]
pub struct TestSuite {
    client: TestClient,
    connection: DatabaseConnection,
}

impl TestSuite {
    pub async fn init() -> Result<Self, BoxError> {
        let state = ApplicationState::from_config(&Config::in_memory()).await?;
        let connection = state.connection().clone();
        let client = TestClient::new(crate::routes::router(state));

        Ok(Self { client, connection })
    }

    /// Registers `<name>@example.com` with the password `password`.
    pub async fn register(&self, name: &str, role: Role) -> Result<AuthResponse, BoxError> {
        let response = self
            .client
            .post("/api/register")
            .json(&json!({
                "username": name,
                "email": format!("{name}@example.com"),
                "password": "password",
                "role": role,
            }))
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(format!("registration failed: {}", response.text()).into());
        }

        Ok(response.json::<AuthResponse>()?)
    }
}
