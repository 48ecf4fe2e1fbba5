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

use crate::prelude::*;
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use strum::{Display, EnumString};
use surrealdb::sql::{Datetime, Thing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeType {
    Create,
    Update,
    Assign,
}

/// One entry of the append-only audit log of task mutations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters, CopyGetters)]
pub struct TaskHistory {
    #[get = "pub"]
    id: Id,
    #[get = "pub"]
    task_id: Id,
    /// the acting user
    #[get = "pub"]
    user_id: Id,
    #[get_copy = "pub"]
    change_type: ChangeType,
    #[get = "pub"]
    previous_value: String,
    #[get = "pub"]
    new_value: String,
    #[get = "pub"]
    created_at: DateTime<Utc>,
}

impl TaskHistory {
    /// The entries of the task, oldest first.
    #[instrument(skip(connection))]
    pub async fn list_by_task(
        task: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Vec<TaskHistory>> {
        let entries = sql_span!(connection
            .query("SELECT * FROM task_history WHERE task_id = $task ORDER BY created_at ASC")
            .bind(("task", task.to_thing())))
        .await?
        .take::<Vec<TaskHistory>>(0)?;

        Ok(entries)
    }
}

#[derive(Serialize)]
struct TaskHistoryContent {
    task_id: Thing,
    user_id: Thing,
    change_type: ChangeType,
    previous_value: String,
    new_value: String,
    created_at: Datetime,
}

#[derive(Clone, Setters)]
pub struct WriteTaskHistory<'a> {
    task: &'a Id,
    actor: &'a Id,
    change_type: ChangeType,
    #[set = "pub"]
    previous_value: Option<serde_json::Value>,
    #[set = "pub"]
    new_value: Option<serde_json::Value>,
    connection: &'a DatabaseConnection,
}

impl<'a> WriteTaskHistory<'a> {
    pub fn new(
        task: &'a Id,
        actor: &'a Id,
        change_type: ChangeType,
        connection: &'a DatabaseConnection,
    ) -> Self {
        Self {
            task,
            actor,
            change_type,
            previous_value: None,
            new_value: None,
            connection,
        }
    }
}

impl<'a> IntoFuture for WriteTaskHistory<'a> {
    type Output = Result<TaskHistory>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let content = TaskHistoryContent {
                task_id: self.task.to_thing(),
                user_id: self.actor.to_thing(),
                change_type: self.change_type,
                previous_value: self
                    .previous_value
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
                new_value: self
                    .new_value
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
                created_at: Datetime::from(Utc::now()),
            };

            let id = Id::generate("task_history");
            let entry: Option<TaskHistory> =
                sql_span!(self.connection.create(id.to_thing()).content(content)).await?;
            let entry = entry.ok_or(ApplicationError::InternalServerError)?;
            debug!(task = %self.task, change = %self.change_type, "Recorded task history");

            Ok(entry)
        })
    }
}
