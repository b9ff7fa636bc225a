//! Project/task use-case service.
//!
//! # Responsibility
//! - Validate project/task writes before they reach storage.
//! - Expose completion as a named use-case on top of task updates.
//!
//! # Invariants
//! - `complete_task(id)` behaves exactly like an update to `Done`.
//! - Tag input with blank values is rejected rather than silently dropped.

use super::{require_text, ServiceError, ServiceResult};
use crate::model::tasks::{
    DependencyType, NewProject, NewTask, Project, ProjectPatch, Task, TaskDependency, TaskFilter,
    TaskPatch, TaskStats, TaskStatus, TaskTag,
};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_projects(&self) -> RepoResult<Vec<Project>> {
        self.repo.list_projects()
    }

    pub fn get_project(&self, id: &str) -> RepoResult<Option<Project>> {
        self.repo.get_project(id)
    }

    pub fn create_project(&self, project: NewProject) -> ServiceResult<Project> {
        let project = NewProject {
            name: require_text(&project.name, "name")?,
            ..project
        };
        Ok(self.repo.create_project(&project)?)
    }

    pub fn update_project(&self, id: &str, patch: &ProjectPatch) -> RepoResult<Option<Project>> {
        self.repo.update_project(id, patch)
    }

    /// Hard-deletes the project together with all of its tasks.
    pub fn delete_project(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_project(id)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(filter)
    }

    pub fn list_inbox_tasks(&self) -> RepoResult<Vec<Task>> {
        self.repo.list_inbox_tasks()
    }

    pub fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Creates a task in `Todo` state with `Medium` priority unless given.
    pub fn create_task(&self, task: NewTask) -> ServiceResult<Task> {
        let task = NewTask {
            title: require_text(&task.title, "title")?,
            ..task
        };
        Ok(self.repo.create_task(&task)?)
    }

    /// Applies a partial update; a status of `Done` also stamps `completed_at`.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> RepoResult<Option<Task>> {
        self.repo.update_task(id, patch)
    }

    pub fn complete_task(&self, id: &str) -> RepoResult<Option<Task>> {
        self.repo.update_task(id, &TaskPatch::status(TaskStatus::Done))
    }

    pub fn delete_task(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_task(id)
    }

    pub fn list_tags(&self) -> RepoResult<Vec<TaskTag>> {
        self.repo.list_tags()
    }

    pub fn create_tag(&self, name: &str, color: Option<&str>) -> ServiceResult<TaskTag> {
        let name = require_text(name, "name")?.to_lowercase();
        Ok(self.repo.create_tag(&name, color)?)
    }

    /// Replaces the task's tag set and returns the resulting tags, or `None`
    /// for an unknown task.
    pub fn set_task_tags(
        &self,
        task_id: &str,
        tags: &[String],
    ) -> ServiceResult<Option<Vec<TaskTag>>> {
        if tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ServiceError::MissingField("tag"));
        }
        if !self.repo.set_task_tags(task_id, tags)? {
            return Ok(None);
        }
        Ok(Some(self.repo.list_task_tags(task_id)?))
    }

    pub fn add_dependency(
        &self,
        task_id: &str,
        depends_on_task_id: &str,
        kind: DependencyType,
    ) -> RepoResult<TaskDependency> {
        self.repo.add_dependency(task_id, depends_on_task_id, kind)
    }

    pub fn list_dependencies(&self, task_id: &str) -> RepoResult<Vec<TaskDependency>> {
        self.repo.list_dependencies(task_id)
    }

    pub fn stats(&self) -> RepoResult<TaskStats> {
        self.repo.stats()
    }
}
