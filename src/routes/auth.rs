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

use crate::auth::middleware::protect;
use crate::auth::Authenticate;
use crate::database::definitions::user::{User, WriteUser};
use crate::database::parse_literal;
use crate::prelude::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Router};

pub fn router(state: &ApplicationState) -> Router<ApplicationState> {
    let public = Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/ping", get(ping));
    let authenticated = protect(
        Router::new().route("/api/profile", get(profile)),
        state,
        Scope::Authenticated,
    );

    public.merge(authenticated)
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    /// one of admin, manager or dev
    role: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

async fn register(
    State(state): State<ApplicationState>,
    Json(data): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let role = parse_literal::<Role>(data.role, "role")?;
    let user = WriteUser::from(state.connection())
        .set_username(data.username)
        .set_email(data.email)
        .set_password(data.password)
        .set_role(role)
        .to_owned()
        .await?;
    let token = state.tokens().issue(user.id(), user.role())?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(
    State(state): State<ApplicationState>,
    Json(data): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    // unknown mail and wrong password are indistinguishable
    let user = User::from_email(data.email.as_str(), state.connection())
        .await?
        .ok_or_else(|| ApplicationError::Unauthorized("invalid credentials".to_owned()))?;
    user.login(data.password.as_str())?;

    let token = state.tokens().issue(user.id(), user.role())?;
    info!(user = %user.id(), "Logged in");

    Ok(Json(AuthResponse { token, user }))
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

async fn profile(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>> {
    let user = User::from_id(identity.id(), state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("user not found".to_owned()))?;

    Ok(Json(user))
}
