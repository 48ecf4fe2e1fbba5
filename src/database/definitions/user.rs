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

use crate::auth::hash_password;
use crate::database::required;
use crate::prelude::*;
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use surrealdb::sql::{Datetime, Thing};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters, CopyGetters)]
pub struct User {
    #[get = "pub"]
    id: Id,
    #[get = "pub"]
    username: String,
    #[get = "pub"]
    email: String,
    #[get = "pub"]
    #[serde(default, skip_serializing)]
    password_hash: String,
    #[get_copy = "pub"]
    role: Role,
    #[get = "pub"]
    created_at: DateTime<Utc>,
    #[get = "pub"]
    updated_at: DateTime<Utc>,
}

impl User {
    #[instrument(skip(connection))]
    pub async fn from_id(id: &Id, connection: &DatabaseConnection) -> Result<Option<User>> {
        Ok(sql_span!(connection.select(id.to_thing())).await?)
    }

    #[instrument(skip(connection))]
    pub async fn from_email(email: &str, connection: &DatabaseConnection) -> Result<Option<User>> {
        let user = sql_span!(connection
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_owned())))
        .await?
        .take::<Option<User>>(0)?;

        Ok(user)
    }

    #[instrument(skip_all)]
    pub async fn list(connection: &DatabaseConnection) -> Result<Vec<User>> {
        let users = sql_span!(connection.query("SELECT * FROM user ORDER BY created_at ASC"))
            .await?
            .take::<Vec<User>>(0)?;

        Ok(users)
    }

    /// Fetches every existing user out of the given ids; unknown ids are skipped.
    #[instrument(skip_all)]
    pub async fn from_ids(ids: Vec<Thing>, connection: &DatabaseConnection) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sql_span!(connection
            .query("SELECT * FROM user WHERE id INSIDE $ids")
            .bind(("ids", ids)))
        .await?
        .take::<Vec<User>>(0)?;

        Ok(users)
    }

    #[instrument(skip(connection))]
    async fn is_taken(
        username: &str,
        email: &str,
        connection: &DatabaseConnection,
    ) -> Result<bool> {
        let taken = sql_span!(connection
            .query("SELECT count() AS total FROM user WHERE username = $username OR email = $email GROUP ALL")
            .bind(("username", username.to_owned()))
            .bind(("email", email.to_owned())))
        .await?
        .take::<Option<i64>>((0, "total"))?;

        Ok(taken.unwrap_or_default() > 0)
    }
}

#[derive(Serialize)]
struct UserContent {
    username: String,
    email: String,
    password_hash: String,
    role: Role,
    created_at: Datetime,
    updated_at: Datetime,
}

/// Registers a new user. The role falls back to [`Role::Dev`].
#[derive(Clone, Setters)]
pub struct WriteUser<'a> {
    #[set = "pub"]
    username: Option<String>,
    #[set = "pub"]
    email: Option<String>,
    #[set = "pub"]
    password: Option<String>,
    #[set = "pub"]
    role: Option<Role>,
    connection: &'a DatabaseConnection,
}

impl<'a> From<&'a DatabaseConnection> for WriteUser<'a> {
    fn from(connection: &'a DatabaseConnection) -> Self {
        Self {
            username: None,
            email: None,
            password: None,
            role: None,
            connection,
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn already_in_use() -> ApplicationError {
    ApplicationError::BadRequest("username or email already in use".to_owned())
}

/// Whether the store rejected the record because of the `user_username` or `user_email` index.
fn is_unique_violation(error: &surrealdb::Error) -> bool {
    match error {
        surrealdb::Error::Db(surrealdb::error::Db::IndexExists { .. }) => true,
        // remote engines only carry the message
        other => other.to_string().contains("already contains"),
    }
}

impl<'a> IntoFuture for WriteUser<'a> {
    type Output = Result<User>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    #[instrument(skip_all)]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let username = required(self.username, "username")?;
            let email = required(self.email, "email")?;
            let password = required(self.password, "password")?;

            if !is_valid_email(email.as_str()) {
                return Err(ApplicationError::BadRequest("invalid email".to_owned()));
            }
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(ApplicationError::BadRequest(format!(
                    "password must be at least {MIN_PASSWORD_LENGTH} characters"
                )));
            }
            if User::is_taken(username.as_str(), email.as_str(), self.connection).await? {
                return Err(already_in_use());
            }

            let now = Datetime::from(Utc::now());
            let content = UserContent {
                username,
                email,
                password_hash: hash_password(password.as_str())?,
                role: self.role.unwrap_or_default(),
                created_at: now.clone(),
                updated_at: now,
            };

            let id = Id::generate("user");
            // a concurrent registration can still win the race for the unique index
            let user: Option<User> =
                sql_span!(self.connection.create(id.to_thing()).content(content))
                    .await
                    .map_err(|error| {
                        if is_unique_violation(&error) {
                            already_in_use()
                        } else {
                            ApplicationError::from(error)
                        }
                    })?;
            let user = user.ok_or(ApplicationError::InternalServerError)?;
            info!(user = %user.id, role = %user.role, "Registered user");

            Ok(user)
        })
    }
}
