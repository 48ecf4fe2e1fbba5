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
use crate::database::definitions::history::TaskHistory;
use crate::database::definitions::project::{Project, ProjectDetails};
use crate::database::definitions::task::{AssignedTask, EditTask, Task, TaskDetails, WriteTask};
use crate::prelude::*;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Router};

pub fn router(state: &ApplicationState) -> Router<ApplicationState> {
    protect(
        Router::new()
            .route("/api/dev/projects/:id", get(get_project))
            .route("/api/dev/projects/:id/tasks", get(list_tasks))
            .route("/api/dev/tasks", post(create_task))
            .route("/api/dev/tasks/:id", get(get_task).put(update_task))
            .route("/api/dev/tasks/:id/history", get(task_history)),
        state,
        Scope::Developer,
    )
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    project_id: Option<RawId>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
}

async fn get_project(
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetails>> {
    let id = Id::parse("project", id.as_str())?;
    let project = Project::details(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("project not found".to_owned()))?;

    Ok(Json(project))
}

async fn list_tasks(
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AssignedTask>>> {
    let id = Id::parse("project", id.as_str())?;

    Ok(Json(Task::list_by_project(&id, state.connection()).await?))
}

async fn create_task(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
    Json(data): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let project = data
        .project_id
        .map(|raw| raw.into_id("project"))
        .transpose()?;

    // tasks start out assigned to their creator
    let task = WriteTask::new(identity.id(), state.connection())
        .set_title(data.title)
        .set_description(data.description)
        .set_status(data.status)
        .set_priority(data.priority)
        .set_project(project)
        .set_assignee(Some(identity.id().clone()))
        .to_owned()
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<TaskDetails>> {
    let id = Id::parse("task", id.as_str())?;
    let task = Task::details(&id, state.connection())
        .await?
        .ok_or_else(|| ApplicationError::NotFound("task not found".to_owned()))?;

    Ok(Json(task))
}

async fn update_task(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(data): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    let id = Id::parse("task", id.as_str())?;
    let task = EditTask::new(&id, identity.id(), state.connection())
        .set_title(data.title)
        .set_description(data.description)
        .set_status(data.status)
        .set_priority(data.priority)
        .to_owned()
        .await?;

    Ok(Json(task))
}

async fn task_history(
    State(state): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TaskHistory>>> {
    let id = Id::parse("task", id.as_str())?;
    if Task::from_id(&id, state.connection()).await?.is_none() {
        return Err(ApplicationError::NotFound("task not found".to_owned()));
    }

    Ok(Json(
        TaskHistory::list_by_task(&id, state.connection()).await?,
    ))
}
