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

use crate::database::definitions::user::User;
use crate::database::required;
use crate::prelude::*;
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use surrealdb::sql::{Datetime, Thing};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct Workspace {
    id: Id,
    name: String,
    owner_id: Id,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Workspace {
    #[instrument(skip(connection))]
    pub async fn from_id(id: &Id, connection: &DatabaseConnection) -> Result<Option<Workspace>> {
        Ok(sql_span!(connection.select(id.to_thing())).await?)
    }

    #[instrument(skip(connection))]
    pub async fn list_by_owner(
        owner: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Vec<Workspace>> {
        let workspaces = sql_span!(connection
            .query("SELECT * FROM workspace WHERE owner_id = $owner ORDER BY created_at ASC")
            .bind(("owner", owner.to_thing())))
        .await?
        .take::<Vec<Workspace>>(0)?;

        Ok(workspaces)
    }
}

#[derive(Serialize)]
struct WorkspaceContent {
    name: String,
    owner_id: Thing,
    created_at: Datetime,
    updated_at: Datetime,
}

#[derive(Clone, Setters)]
pub struct WriteWorkspace<'a> {
    #[set = "pub"]
    name: Option<String>,
    owner: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> WriteWorkspace<'a> {
    /// The owner is the user creating the workspace.
    pub fn new(owner: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self {
            name: None,
            owner,
            connection,
        }
    }
}

impl<'a> IntoFuture for WriteWorkspace<'a> {
    type Output = Result<Workspace>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    #[instrument(skip_all)]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let name = required(self.name, "name")?;

            if User::from_id(self.owner, self.connection).await?.is_none() {
                return Err(ApplicationError::NotFound("owner not found".to_owned()));
            }

            let now = Datetime::from(Utc::now());
            let content = WorkspaceContent {
                name,
                owner_id: self.owner.to_thing(),
                created_at: now.clone(),
                updated_at: now,
            };

            let id = Id::generate("workspace");
            let workspace: Option<Workspace> =
                sql_span!(self.connection.create(id.to_thing()).content(content)).await?;
            let workspace = workspace.ok_or(ApplicationError::InternalServerError)?;
            info!(workspace = %workspace.id, owner = %workspace.owner_id, "Created workspace");

            Ok(workspace)
        })
    }
}
