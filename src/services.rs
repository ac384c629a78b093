// To-do business logic over an injected repository

use crate::models::{Todo, TodoCreate, TodoUpdate};
use crate::repositories::{InMemoryTodoRepository, TodoRepository};
use std::sync::Arc;
use tracing::debug;

/// Service layer between the routes and a [`TodoRepository`]
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    /// Service backed by a fresh [`InMemoryTodoRepository`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()))
    }

    pub fn get_all_todos(&self) -> Vec<Todo> {
        self.repository.get_all()
    }

    pub fn get_todo(&self, id: u64) -> Option<Todo> {
        self.repository.get_by_id(id)
    }

    pub fn create_todo(&self, data: TodoCreate) -> Todo {
        let todo = self.repository.create(data);
        debug!(id = todo.id, "Todo created");
        todo
    }

    pub fn update_todo(&self, id: u64, data: TodoUpdate) -> Option<Todo> {
        self.repository.update(id, data)
    }

    pub fn delete_todo(&self, id: u64) -> bool {
        let deleted = self.repository.delete(id);
        debug!(id, deleted, "Todo delete");
        deleted
    }

    pub fn toggle_todo_completed(&self, id: u64) -> Option<Todo> {
        self.repository.toggle_completed(id)
    }
}
