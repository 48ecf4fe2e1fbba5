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

use crate::database::definitions::history::{ChangeType, WriteTaskHistory};
use crate::database::definitions::project::Project;
use crate::database::definitions::user::User;
use crate::database::{parse_literal, required};
use crate::prelude::*;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use strum::{Display, EnumString};
use surrealdb::sql::{Datetime, Thing};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters, CopyGetters)]
pub struct Task {
    #[get = "pub"]
    id: Id,
    #[get = "pub"]
    title: String,
    #[get = "pub"]
    #[serde(default)]
    description: String,
    #[get_copy = "pub"]
    status: TaskStatus,
    #[get_copy = "pub"]
    priority: TaskPriority,
    #[get = "pub"]
    #[serde(default)]
    assignee_id: Option<Id>,
    #[get = "pub"]
    project_id: Id,
    #[get = "pub"]
    created_at: DateTime<Utc>,
    #[get = "pub"]
    updated_at: DateTime<Utc>,
}

/// A task as listed inside a project, carrying its assignee when the user still exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct AssignedTask {
    #[serde(flatten)]
    task: Task,
    assignee: Option<User>,
}

/// A single task with its assignee and project resolved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct TaskDetails {
    #[serde(flatten)]
    task: Task,
    assignee: Option<User>,
    project: Option<Project>,
}

impl Task {
    #[instrument(skip(connection))]
    pub async fn from_id(id: &Id, connection: &DatabaseConnection) -> Result<Option<Task>> {
        Ok(sql_span!(connection.select(id.to_thing())).await?)
    }

    #[instrument(skip(connection))]
    pub async fn details(id: &Id, connection: &DatabaseConnection) -> Result<Option<TaskDetails>> {
        let task = match Task::from_id(id, connection).await? {
            Some(task) => task,
            None => return Ok(None),
        };
        let assignee = match task.assignee_id.as_ref() {
            Some(assignee) => User::from_id(assignee, connection).await?,
            None => None,
        };
        let project = Project::from_id(&task.project_id, connection).await?;

        Ok(Some(TaskDetails {
            task,
            assignee,
            project,
        }))
    }

    #[instrument(skip(connection))]
    pub async fn list_by_project(
        project: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Vec<AssignedTask>> {
        let tasks = sql_span!(connection
            .query("SELECT * FROM task WHERE project_id = $project ORDER BY created_at ASC")
            .bind(("project", project.to_thing())))
        .await?
        .take::<Vec<Task>>(0)?;

        // resolve all assignees with a single query
        let assignees = tasks
            .iter()
            .filter_map(|task| task.assignee_id.clone())
            .collect::<HashSet<Id>>()
            .iter()
            .map(Id::to_thing)
            .collect::<Vec<Thing>>();
        let users = User::from_ids(assignees, connection)
            .await?
            .into_iter()
            .map(|user| (user.id().clone(), user))
            .collect::<HashMap<Id, User>>();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let assignee = task
                    .assignee_id
                    .as_ref()
                    .and_then(|id| users.get(id).cloned());
                AssignedTask { task, assignee }
            })
            .collect())
    }

    /// The mutable fields, as recorded in the history.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "priority": self.priority,
        })
    }
}

#[derive(Serialize)]
struct TaskContent {
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    assignee_id: Option<Thing>,
    project_id: Thing,
    created_at: Datetime,
    updated_at: Datetime,
}

#[derive(Clone, Setters)]
pub struct WriteTask<'a> {
    #[set = "pub"]
    title: Option<String>,
    #[set = "pub"]
    description: Option<String>,
    #[set = "pub"]
    status: Option<String>,
    #[set = "pub"]
    priority: Option<String>,
    #[set = "pub"]
    project: Option<Id>,
    #[set = "pub"]
    assignee: Option<Id>,
    actor: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> WriteTask<'a> {
    pub fn new(actor: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self {
            title: None,
            description: None,
            status: None,
            priority: None,
            project: None,
            assignee: None,
            actor,
            connection,
        }
    }
}

impl<'a> IntoFuture for WriteTask<'a> {
    type Output = Result<Task>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let title = required(self.title, "title")?;
            let project = self
                .project
                .ok_or_else(|| ApplicationError::BadRequest("project_id is required".to_owned()))?;
            let status = parse_literal::<TaskStatus>(self.status, "status")?.unwrap_or_default();
            let priority =
                parse_literal::<TaskPriority>(self.priority, "priority")?.unwrap_or_default();

            if Project::from_id(&project, self.connection).await?.is_none() {
                return Err(ApplicationError::NotFound("project not found".to_owned()));
            }

            let now = Datetime::from(Utc::now());
            let content = TaskContent {
                title,
                description: self.description.unwrap_or_default(),
                status,
                priority,
                assignee_id: self.assignee.as_ref().map(Id::to_thing),
                project_id: project.to_thing(),
                created_at: now.clone(),
                updated_at: now,
            };

            let id = Id::generate("task");
            let task: Option<Task> =
                sql_span!(self.connection.create(id.to_thing()).content(content)).await?;
            let task = task.ok_or(ApplicationError::InternalServerError)?;
            info!(task = %task.id, project = %task.project_id, "Created task");

            WriteTaskHistory::new(&task.id, self.actor, ChangeType::Create, self.connection)
                .set_new_value(Some(task.snapshot()))
                .to_owned()
                .await?;

            Ok(task)
        })
    }
}

#[derive(Serialize)]
struct TaskPatch {
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    updated_at: Datetime,
}

/// Partial update of title, description, status and priority.
/// Empty strings count as absent, so a field can not be cleared this way.
#[derive(Clone, Setters)]
pub struct EditTask<'a> {
    #[set = "pub"]
    title: Option<String>,
    #[set = "pub"]
    description: Option<String>,
    #[set = "pub"]
    status: Option<String>,
    #[set = "pub"]
    priority: Option<String>,
    target: &'a Id,
    actor: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> EditTask<'a> {
    pub fn new(target: &'a Id, actor: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self {
            title: None,
            description: None,
            status: None,
            priority: None,
            target,
            actor,
            connection,
        }
    }
}

impl<'a> IntoFuture for EditTask<'a> {
    type Output = Result<Task>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let title = self.title.filter(|value| !value.is_empty());
            let description = self.description.filter(|value| !value.is_empty());
            let status = parse_literal::<TaskStatus>(self.status, "status")?;
            let priority = parse_literal::<TaskPriority>(self.priority, "priority")?;

            let task = Task::from_id(self.target, self.connection)
                .await?
                .ok_or_else(|| ApplicationError::NotFound("task not found".to_owned()))?;

            let patch = TaskPatch {
                title: title.unwrap_or_else(|| task.title.clone()),
                description: description.unwrap_or_else(|| task.description.clone()),
                status: status.unwrap_or(task.status),
                priority: priority.unwrap_or(task.priority),
                updated_at: Datetime::from(Utc::now()),
            };

            let updated: Option<Task> =
                sql_span!(self.connection.update(self.target.to_thing()).merge(patch)).await?;
            let updated = updated
                .ok_or_else(|| ApplicationError::NotFound("task not found".to_owned()))?;
            info!(task = %updated.id, status = %updated.status, "Updated task");

            WriteTaskHistory::new(&updated.id, self.actor, ChangeType::Update, self.connection)
                .set_previous_value(Some(task.snapshot()))
                .set_new_value(Some(updated.snapshot()))
                .to_owned()
                .await?;

            Ok(updated)
        })
    }
}

#[derive(Serialize)]
struct AssigneePatch {
    assignee_id: Thing,
    updated_at: Datetime,
}

/// Sets the assignee of an existing task. The assignee itself is not looked up.
#[derive(Clone, Setters)]
pub struct AssignTask<'a> {
    #[set = "pub"]
    assignee: Option<Id>,
    target: &'a Id,
    actor: &'a Id,
    connection: &'a DatabaseConnection,
}

impl<'a> AssignTask<'a> {
    pub fn new(target: &'a Id, actor: &'a Id, connection: &'a DatabaseConnection) -> Self {
        Self {
            assignee: None,
            target,
            actor,
            connection,
        }
    }
}

impl<'a> IntoFuture for AssignTask<'a> {
    type Output = Result<Task>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let assignee = self
                .assignee
                .ok_or_else(|| ApplicationError::BadRequest("assignee_id is required".to_owned()))?;

            let task = Task::from_id(self.target, self.connection)
                .await?
                .ok_or_else(|| ApplicationError::NotFound("task not found".to_owned()))?;

            let patch = AssigneePatch {
                assignee_id: assignee.to_thing(),
                updated_at: Datetime::from(Utc::now()),
            };
            let updated: Option<Task> =
                sql_span!(self.connection.update(self.target.to_thing()).merge(patch)).await?;
            let updated = updated
                .ok_or_else(|| ApplicationError::NotFound("task not found".to_owned()))?;
            info!(task = %updated.id, assignee = %assignee, "Assigned task");

            WriteTaskHistory::new(&updated.id, self.actor, ChangeType::Assign, self.connection)
                .set_previous_value(Some(json!({ "assignee_id": task.assignee_id })))
                .set_new_value(Some(json!({ "assignee_id": assignee })))
                .to_owned()
                .await?;

            Ok(updated)
        })
    }
}
