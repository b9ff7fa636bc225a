//! Project/task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over projects and tasks.
//! - Own tag-set replacement and dependency bookkeeping for tasks.
//! - Apply the `status -> done` completion stamp inside task updates.
//!
//! # Invariants
//! - New tasks always start as `todo`.
//! - `completed_at` changes only when an update sets status to `done`.
//! - Deleting a project deletes its tasks first, in one transaction.
//! - Deleting a task removes its tag links and dependency rows with it.
//! - Tag names are normalized to lowercase before persistence.

use super::common::{
    ensure_tables, load_required, new_record_id, parse_enum, query_all, query_one,
    Assignments, RepoResult, NOW_SQL,
};
use crate::model::tasks::{
    DependencyType, NewProject, NewTask, Project, ProjectPatch, ProjectStatus, Task,
    TaskDependency, TaskFilter, TaskPatch, TaskPriority, TaskStats, TaskStatus, TaskTag,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    color,
    icon,
    status,
    due_date,
    created_at,
    updated_at
FROM projects";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    description,
    status,
    priority,
    due_date,
    estimated_minutes,
    actual_minutes,
    completed_at,
    created_at,
    updated_at
FROM tasks";

const TAG_SELECT_SQL: &str = "SELECT id, name, color, created_at FROM task_tags";

const DEPENDENCY_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    depends_on_task_id,
    type,
    created_at
FROM task_dependencies";

/// Repository interface for projects, tasks, tags and dependencies.
pub trait TaskRepository {
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn get_project(&self, id: &str) -> RepoResult<Option<Project>>;
    fn create_project(&self, project: &NewProject) -> RepoResult<Project>;
    fn update_project(&self, id: &str, patch: &ProjectPatch) -> RepoResult<Option<Project>>;
    /// Deletes the project and every task under it.
    fn delete_project(&self, id: &str) -> RepoResult<bool>;

    fn list_tasks(&self, filter: &TaskFilter) -> RepoResult<Vec<Task>>;
    /// Lists tasks that belong to no project.
    fn list_inbox_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    fn create_task(&self, task: &NewTask) -> RepoResult<Task>;
    fn update_task(&self, id: &str, patch: &TaskPatch) -> RepoResult<Option<Task>>;
    fn delete_task(&self, id: &str) -> RepoResult<bool>;

    fn list_tags(&self) -> RepoResult<Vec<TaskTag>>;
    fn create_tag(&self, name: &str, color: Option<&str>) -> RepoResult<TaskTag>;
    fn list_task_tags(&self, task_id: &str) -> RepoResult<Vec<TaskTag>>;
    /// Replaces the full tag set of a task. Returns `false` for unknown tasks.
    fn set_task_tags(&self, task_id: &str, tags: &[String]) -> RepoResult<bool>;

    fn add_dependency(
        &self,
        task_id: &str,
        depends_on_task_id: &str,
        kind: DependencyType,
    ) -> RepoResult<TaskDependency>;
    fn list_dependencies(&self, task_id: &str) -> RepoResult<Vec<TaskDependency>>;

    fn stats(&self) -> RepoResult<TaskStats>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                "projects",
                "tasks",
                "task_tags",
                "tasks_to_tags",
                "task_dependencies",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        query_all(
            self.conn,
            &format!("{PROJECT_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"),
            Vec::new(),
            parse_project_row,
        )
    }

    fn get_project(&self, id: &str) -> RepoResult<Option<Project>> {
        query_one(
            self.conn,
            &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_project_row,
        )
    }

    fn create_project(&self, project: &NewProject) -> RepoResult<Project> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO projects (id, name, description, color, status, due_date)
             VALUES (?1, ?2, ?3, ?4, 'active', ?5);",
            params![
                id,
                project.name,
                project.description,
                project.color,
                project.due_date,
            ],
        )?;
        load_required(self.get_project(&id)?, "projects", &id)
    }

    fn update_project(&self, id: &str, patch: &ProjectPatch) -> RepoResult<Option<Project>> {
        let changed = Assignments::default()
            .text("name", patch.name.as_deref())
            .text("description", patch.description.as_deref())
            .text("color", patch.color.as_deref())
            .text("status", patch.status.map(ProjectStatus::as_str))
            .text("due_date", patch.due_date.as_deref())
            .execute(self.conn, "projects", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_project(id)
    }

    fn delete_project(&self, id: &str) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        // Junction and dependency rows go with the tasks via ON DELETE CASCADE.
        let removed_tasks = tx.execute("DELETE FROM tasks WHERE project_id = ?1;", [id])?;
        let changed = tx.execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!(
            "event=project_delete module=repo status=ok found={} removed_tasks={}",
            changed > 0,
            removed_tasks
        );
        Ok(changed > 0)
    }

    fn list_tasks(&self, filter: &TaskFilter) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(project_id) = filter.project_id.as_ref() {
            sql.push_str(" AND project_id = ?");
            bind_values.push(Value::Text(project_id.clone()));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC;");
        query_all(self.conn, &sql, bind_values, parse_task_row)
    }

    fn list_inbox_tasks(&self) -> RepoResult<Vec<Task>> {
        query_all(
            self.conn,
            &format!(
                "{TASK_SELECT_SQL} WHERE project_id IS NULL ORDER BY created_at DESC, rowid DESC;"
            ),
            Vec::new(),
            parse_task_row,
        )
    }

    fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        query_one(
            self.conn,
            &format!("{TASK_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_task_row,
        )
    }

    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                project_id,
                title,
                description,
                status,
                priority,
                due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id,
                task.project_id,
                task.title,
                task.description,
                TaskStatus::Todo.as_str(),
                task.priority.unwrap_or_default().as_str(),
                task.due_date,
            ],
        )?;
        load_required(self.get_task(&id)?, "tasks", &id)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> RepoResult<Option<Task>> {
        let mut assignments = Assignments::default();
        assignments
            .text("title", patch.title.as_deref())
            .text("description", patch.description.as_deref())
            .text("project_id", patch.project_id.as_deref())
            .text("status", patch.status.map(TaskStatus::as_str))
            .text("priority", patch.priority.map(TaskPriority::as_str))
            .text("due_date", patch.due_date.as_deref())
            .integer("estimated_minutes", patch.estimated_minutes)
            .integer("actual_minutes", patch.actual_minutes);
        if patch.stamps_completion() {
            assignments.now("completed_at");
        }

        let changed = assignments.execute(self.conn, "tasks", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_task(id)
    }

    fn delete_task(&self, id: &str) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM tasks_to_tags WHERE task_id = ?1;", [id])?;
        tx.execute(
            "DELETE FROM task_dependencies WHERE task_id = ?1 OR depends_on_task_id = ?1;",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn list_tags(&self) -> RepoResult<Vec<TaskTag>> {
        query_all(
            self.conn,
            &format!("{TAG_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC;"),
            Vec::new(),
            parse_tag_row,
        )
    }

    fn create_tag(&self, name: &str, color: Option<&str>) -> RepoResult<TaskTag> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO task_tags (id, name, color) VALUES (?1, ?2, ?3);",
            params![id, name, color],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{TAG_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_tag_row,
        )?;
        load_required(loaded, "task_tags", &id)
    }

    fn list_task_tags(&self, task_id: &str) -> RepoResult<Vec<TaskTag>> {
        query_all(
            self.conn,
            "SELECT t.id AS id, t.name AS name, t.color AS color, t.created_at AS created_at
             FROM tasks_to_tags tt
             INNER JOIN task_tags t ON t.id = tt.tag_id
             WHERE tt.task_id = ?
             ORDER BY t.name COLLATE NOCASE ASC;",
            vec![Value::Text(task_id.to_string())],
            parse_tag_row,
        )
    }

    fn set_task_tags(&self, task_id: &str, tags: &[String]) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [task_id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Ok(false);
        }

        tx.execute("DELETE FROM tasks_to_tags WHERE task_id = ?1;", [task_id])?;
        for tag in normalize_tags(tags) {
            tx.execute(
                "INSERT OR IGNORE INTO task_tags (id, name) VALUES (?1, ?2);",
                params![new_record_id(), tag],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO tasks_to_tags (task_id, tag_id)
                 SELECT ?1, id
                 FROM task_tags
                 WHERE name = ?2 COLLATE NOCASE;",
                params![task_id, tag],
            )?;
        }
        tx.execute(
            &format!("UPDATE tasks SET updated_at = {NOW_SQL} WHERE id = ?1;"),
            [task_id],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn add_dependency(
        &self,
        task_id: &str,
        depends_on_task_id: &str,
        kind: DependencyType,
    ) -> RepoResult<TaskDependency> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO task_dependencies (id, task_id, depends_on_task_id, type)
             VALUES (?1, ?2, ?3, ?4);",
            params![id, task_id, depends_on_task_id, kind.as_str()],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{DEPENDENCY_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_dependency_row,
        )?;
        load_required(loaded, "task_dependencies", &id)
    }

    fn list_dependencies(&self, task_id: &str) -> RepoResult<Vec<TaskDependency>> {
        query_all(
            self.conn,
            &format!("{DEPENDENCY_SELECT_SQL} WHERE task_id = ? ORDER BY created_at ASC, rowid ASC;"),
            vec![Value::Text(task_id.to_string())],
            parse_dependency_row,
        )
    }

    fn stats(&self) -> RepoResult<TaskStats> {
        let (total_tasks, todo_tasks, in_progress_tasks, completed_tasks): (i64, i64, i64, i64) =
            self.conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'todo'), 0),
                    COALESCE(SUM(status = 'in_progress'), 0),
                    COALESCE(SUM(status = 'done'), 0)
                 FROM tasks;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        let (total_projects, active_projects): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(status = 'active'), 0) FROM projects;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(TaskStats {
            total_tasks: to_count(total_tasks),
            todo_tasks: to_count(todo_tasks),
            in_progress_tasks: to_count(in_progress_tasks),
            completed_tasks: to_count(completed_tasks),
            total_projects: to_count(total_projects),
            active_projects: to_count(active_projects),
        })
    }
}

/// Normalizes one tag value: trimmed, lowercase, `None` when blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

pub(crate) fn to_count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let status_text: String = row.get("status")?;
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        status: parse_enum(&status_text, "projects.status", ProjectStatus::parse)?,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let priority_text: String = row.get("priority")?;
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_enum(&status_text, "tasks.status", TaskStatus::parse)?,
        priority: parse_enum(&priority_text, "tasks.priority", TaskPriority::parse)?,
        due_date: row.get("due_date")?,
        estimated_minutes: row.get("estimated_minutes")?,
        actual_minutes: row.get("actual_minutes")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<TaskTag> {
    Ok(TaskTag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_dependency_row(row: &Row<'_>) -> RepoResult<TaskDependency> {
    let type_text: String = row.get("type")?;
    Ok(TaskDependency {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        depends_on_task_id: row.get("depends_on_task_id")?,
        kind: parse_enum(&type_text, "task_dependencies.type", DependencyType::parse)?,
        created_at: row.get("created_at")?,
    })
}
