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
use crate::database::definitions::project::{Project, WriteProject};
use crate::database::definitions::task::{AssignTask, Task};
use crate::database::definitions::workspace::{WriteWorkspace, Workspace};
use crate::prelude::*;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Extension, Router};

pub fn router(state: &ApplicationState) -> Router<ApplicationState> {
    protect(
        Router::new()
            .route(
                "/api/manager/workspaces",
                post(create_workspace).get(list_workspaces),
            )
            .route(
                "/api/manager/workspaces/:workspace_id/projects",
                get(list_projects),
            )
            .route("/api/manager/projects", post(create_project))
            .route("/api/manager/tasks/:id/assign", put(assign_task)),
        state,
        Scope::Manager,
    )
}

#[derive(Deserialize, Debug, Clone)]
pub struct WorkspaceRequest {
    name: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectRequest {
    name: Option<String>,
    workspace_id: Option<RawId>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AssignRequest {
    assignee_id: Option<RawId>,
}

async fn create_workspace(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
    Json(data): Json<WorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>)> {
    let workspace = WriteWorkspace::new(identity.id(), state.connection())
        .set_name(data.name)
        .to_owned()
        .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

async fn list_workspaces(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Workspace>>> {
    Ok(Json(
        Workspace::list_by_owner(identity.id(), state.connection()).await?,
    ))
}

async fn list_projects(
    State(state): State<ApplicationState>,
    Path(workspace): Path<String>,
) -> Result<Json<Vec<Project>>> {
    let workspace = Id::parse("workspace", workspace.as_str())?;

    Ok(Json(
        Project::list_by_workspace(&workspace, state.connection()).await?,
    ))
}

async fn create_project(
    State(state): State<ApplicationState>,
    Json(data): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<Project>)> {
    let workspace = data
        .workspace_id
        .map(|raw| raw.into_id("workspace"))
        .transpose()?;
    let project = WriteProject::from(state.connection())
        .set_name(data.name)
        .set_workspace(workspace)
        .to_owned()
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

async fn assign_task(
    State(state): State<ApplicationState>,
    Extension(identity): Extension<Identity>,
    Path(task): Path<String>,
    Json(data): Json<AssignRequest>,
) -> Result<Json<Task>> {
    let task = Id::parse("task", task.as_str())?;
    let assignee = data
        .assignee_id
        .map(|raw| raw.into_id("user"))
        .transpose()?;

    let task = AssignTask::new(&task, identity.id(), state.connection())
        .set_assignee(assignee)
        .to_owned()
        .await?;

    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::project::Project;
    use crate::database::definitions::task::Task;
    use crate::database::definitions::workspace::Workspace;
    use crate::prelude::{Id, Role};
    use crate::tests::TestSuite;
    use axum::http::StatusCode;
    use axum::BoxError;

    #[tokio::test]
    async fn test_create_workspace_requires_manager() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let developer = suite.register("developer", Role::Dev).await?;

        let response = suite
            .client()
            .post("/api/manager/workspaces")
            .bearer(developer.token.as_str())
            .json(&json!({ "name": "platform" }))
            .send()
            .await?;
        assert_eq!(StatusCode::FORBIDDEN, response.status());

        let response = suite
            .client()
            .post("/api/manager/workspaces")
            .json(&json!({ "name": "platform" }))
            .send()
            .await?;
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());

        for (name, role) in [("manager", Role::Manager), ("root", Role::Admin)] {
            let registered = suite.register(name, role).await?;
            let response = suite
                .client()
                .post("/api/manager/workspaces")
                .bearer(registered.token.as_str())
                .json(&json!({ "name": "platform" }))
                .send()
                .await?;
            assert_eq!(StatusCode::CREATED, response.status());

            let workspace = response.json::<Workspace>()?;
            assert_eq!(workspace.name(), "platform");
            assert_eq!(workspace.owner_id(), registered.user.id());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_workspace_validation_and_listing() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let manager = suite.register("manager", Role::Manager).await?;
        let other = suite.register("other", Role::Manager).await?;

        let response = suite
            .client()
            .post("/api/manager/workspaces")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "" }))
            .send()
            .await?;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        for name in ["first", "second"] {
            suite
                .client()
                .post("/api/manager/workspaces")
                .bearer(manager.token.as_str())
                .json(&json!({ "name": name }))
                .send()
                .await?;
        }

        let response = suite
            .client()
            .get("/api/manager/workspaces")
            .bearer(manager.token.as_str())
            .send()
            .await?;
        let names = response
            .json::<Vec<Workspace>>()?
            .iter()
            .map(|workspace| workspace.name().clone())
            .collect::<Vec<String>>();
        assert_eq!(names, vec!["first", "second"]);

        let response = suite
            .client()
            .get("/api/manager/workspaces")
            .bearer(other.token.as_str())
            .send()
            .await?;
        assert!(response.json::<Vec<Workspace>>()?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_projects() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let manager = suite.register("manager", Role::Manager).await?;
        let workspace = suite
            .client()
            .post("/api/manager/workspaces")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "platform" }))
            .send()
            .await?
            .json::<Workspace>()?;

        let response = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "api", "workspace_id": workspace.id() }))
            .send()
            .await?;
        assert_eq!(StatusCode::CREATED, response.status());
        let project = response.json::<Project>()?;
        assert_eq!(project.workspace_id(), workspace.id());

        // a bare key names the same workspace
        let response = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "web", "workspace_id": workspace.id().key }))
            .send()
            .await?;
        assert_eq!(StatusCode::CREATED, response.status());

        let response = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "web", "workspace_id": "missing" }))
            .send()
            .await?;
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        let response = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "web", "workspace_id": "task:abc" }))
            .send()
            .await?;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let response = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "web" }))
            .send()
            .await?;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let response = suite
            .client()
            .get(format!("/api/manager/workspaces/{}/projects", workspace.id()).as_str())
            .bearer(manager.token.as_str())
            .send()
            .await?;
        assert_eq!(StatusCode::OK, response.status());
        let projects = response.json::<Vec<Project>>()?;
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0], project);

        Ok(())
    }

    #[tokio::test]
    async fn test_assign_does_not_check_the_user() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let manager = suite.register("manager", Role::Manager).await?;
        let developer = suite.register("developer", Role::Dev).await?;
        let workspace = suite
            .client()
            .post("/api/manager/workspaces")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "platform" }))
            .send()
            .await?
            .json::<Workspace>()?;
        let project = suite
            .client()
            .post("/api/manager/projects")
            .bearer(manager.token.as_str())
            .json(&json!({ "name": "api", "workspace_id": workspace.id() }))
            .send()
            .await?
            .json::<Project>()?;
        let task = suite
            .client()
            .post("/api/dev/tasks")
            .bearer(developer.token.as_str())
            .json(&json!({ "title": "write docs", "project_id": project.id() }))
            .send()
            .await?
            .json::<Task>()?;
        let uri = format!("/api/manager/tasks/{}/assign", task.id());

        let response = suite
            .client()
            .put(uri.as_str())
            .bearer(developer.token.as_str())
            .json(&json!({ "assignee_id": 7 }))
            .send()
            .await?;
        assert_eq!(StatusCode::FORBIDDEN, response.status());

        let response = suite
            .client()
            .put(uri.as_str())
            .bearer(manager.token.as_str())
            .json(&json!({ "assignee_id": 7 }))
            .send()
            .await?;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            response.json::<Task>()?.assignee_id(),
            &Some(Id::new("user", "7"))
        );

        let response = suite
            .client()
            .put(uri.as_str())
            .bearer(manager.token.as_str())
            .json(&json!({}))
            .send()
            .await?;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let response = suite
            .client()
            .put("/api/manager/tasks/missing/assign")
            .bearer(manager.token.as_str())
            .json(&json!({ "assignee_id": developer.user.id() }))
            .send()
            .await?;
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        Ok(())
    }
}
