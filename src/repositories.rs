//! To-do storage.
//!
//! [`TodoRepository`] is the seam between the service layer and whatever keeps
//! the items. [`InMemoryTodoRepository`] is the only backend: a process-local
//! list behind a lock, lost on restart.

use crate::models::{Todo, TodoCreate, TodoUpdate};
use parking_lot::RwLock;

/// Storage operations for to-do items
pub trait TodoRepository: Send + Sync {
    /// All items in insertion order
    fn get_all(&self) -> Vec<Todo>;

    fn get_by_id(&self, id: u64) -> Option<Todo>;

    fn create(&self, data: TodoCreate) -> Todo;

    /// Apply a partial update, returning the updated item
    fn update(&self, id: u64, data: TodoUpdate) -> Option<Todo>;

    /// Remove an item, returning whether it existed
    fn delete(&self, id: u64) -> bool;

    /// Flip the completed flag, returning the updated item
    fn toggle_completed(&self, id: u64) -> Option<Todo>;
}

struct Store {
    todos: Vec<Todo>,
    next_id: u64,
}

/// Process-local [`TodoRepository`]
///
/// Ids start at 1 and are never reused.
pub struct InMemoryTodoRepository {
    store: RwLock<Store>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store {
                todos: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn modify<F>(&self, id: u64, apply: F) -> Option<Todo>
    where
        F: FnOnce(&mut Todo),
    {
        let mut store = self.store.write();
        let todo = store.todos.iter_mut().find(|t| t.id == id)?;
        apply(todo);
        Some(todo.clone())
    }
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn get_all(&self) -> Vec<Todo> {
        self.store.read().todos.clone()
    }

    fn get_by_id(&self, id: u64) -> Option<Todo> {
        self.store.read().todos.iter().find(|t| t.id == id).cloned()
    }

    fn create(&self, data: TodoCreate) -> Todo {
        let mut store = self.store.write();
        let todo = Todo {
            id: store.next_id,
            title: data.into_title(),
            completed: false,
        };
        store.next_id += 1;
        store.todos.push(todo.clone());
        todo
    }

    fn update(&self, id: u64, data: TodoUpdate) -> Option<Todo> {
        self.modify(id, |todo| {
            if let Some(title) = data.title {
                todo.title = title;
            }
            if let Some(completed) = data.completed {
                todo.completed = completed;
            }
        })
    }

    fn delete(&self, id: u64) -> bool {
        let mut store = self.store.write();
        let before = store.todos.len();
        store.todos.retain(|t| t.id != id);
        store.todos.len() < before
    }

    fn toggle_completed(&self, id: u64) -> Option<Todo> {
        self.modify(id, |todo| todo.completed = !todo.completed)
    }
}
