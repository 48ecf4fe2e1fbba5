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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Error, Debug)]
pub enum ApplicationError {
    /// missing or malformed request fields
    #[error("{0}")]
    BadRequest(String),
    /// missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),
    /// a valid identity without the required role
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    SurrealdbError(#[from] surrealdb::Error),
    #[error(transparent)]
    PasswordHashError(#[from] argon2::password_hash::Error),
    #[error(transparent)]
    TokenError(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    ConfigurationError(#[from] envy::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Internal error occurred")]
    InternalServerError,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApplicationErrorResponse {
    pub error: String,
}

pub type Result<T> = std::result::Result<T, ApplicationError>;

impl ApplicationError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApplicationError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApplicationError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApplicationError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status.is_server_error() {
            // the details stay in the log
            error!("Err: {}", self);
            "Error occurred while processing the request".to_owned()
        } else {
            debug!("Rejected request: {}", self);
            self.to_string()
        };

        (status, axum::Json(ApplicationErrorResponse { error })).into_response()
    }
}
