// Page and to-do route handlers

use crate::models::{TodoCreate, TodoForm};
use crate::services::TodoService;
use hello_htmx_core::{Error, HttpRequest, HttpResponse, Router};
use hello_htmx_csrf::csrf_token;
use hello_htmx_templates::TemplateService;
use serde_json::json;
use std::sync::Arc;

/// Shared handles every controller works from
#[derive(Clone)]
pub struct AppState {
    pub todos: TodoService,
    pub templates: TemplateService,
    /// Name of the CSRF cookie, for reading the active token
    pub csrf_cookie: Arc<str>,
}

impl AppState {
    pub fn new(todos: TodoService, templates: TemplateService, csrf_cookie: &str) -> Self {
        Self {
            todos,
            templates,
            csrf_cookie: Arc::from(csrf_cookie),
        }
    }

    fn csrf_token(&self, req: &HttpRequest) -> String {
        csrf_token(req, &self.csrf_cookie)
    }
}

/// Whether the request was issued by HTMX rather than a full page load
pub fn is_htmx(req: &HttpRequest) -> bool {
    req.header("hx-request") == Some("true")
}

fn todo_id(req: &HttpRequest) -> Result<u64, Error> {
    req.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| Error::NotFound(format!("No route for {}", req.path)))
}

#[derive(Clone)]
pub struct PagesController {
    state: AppState,
}

impl PagesController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn index(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let data = json!({ "csrf_token": self.state.csrf_token(&req) });

        Ok(self.state.templates.render_response("index", &data, 200).await?)
    }

    /// Greeting page; `?name=` defaults to "World"
    pub async fn hello(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let name = req.query("name").map(String::as_str).unwrap_or("World");
        let data = json!({
            "name": name,
            "csrf_token": self.state.csrf_token(&req),
        });

        Ok(self.state.templates.render_response("hello", &data, 200).await?)
    }
}

#[derive(Clone)]
pub struct TodoController {
    state: AppState,
}

impl TodoController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Full page for a normal visit, list fragment for HTMX
    pub async fn list(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let template = if is_htmx(&req) { "todos_partial" } else { "todos" };
        let data = json!({
            "todos": self.state.todos.get_all_todos(),
            "csrf_token": self.state.csrf_token(&req),
        });

        Ok(self.state.templates.render_response(template, &data, 200).await?)
    }

    /// Invalid titles are answered with an error fragment and status 200
    pub async fn create(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let form: TodoForm = req.form()?;

        let response = match TodoCreate::new(&form.title) {
            Ok(data) => {
                let todo = self.state.todos.create_todo(data);
                self.state
                    .templates
                    .render_response("todo_item", &json!({ "todo": todo }), 201)
                    .await?
            }
            Err(err) => {
                self.state
                    .templates
                    .render_response("todo_error", &json!({ "error": err.to_string() }), 200)
                    .await?
            }
        };

        Ok(response)
    }

    pub async fn toggle(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let id = todo_id(&req)?;
        let todo = self
            .state
            .todos
            .toggle_todo_completed(id)
            .ok_or_else(|| Error::NotFound(format!("Todo {} not found", id)))?;

        Ok(self
            .state
            .templates
            .render_response("todo_item", &json!({ "todo": todo }), 200)
            .await?)
    }

    /// Always 200 with an empty body so HTMX swaps the row out
    pub async fn delete(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let id = todo_id(&req)?;
        self.state.todos.delete_todo(id);

        Ok(HttpResponse::ok())
    }
}

/// Mount every page and to-do route
pub fn register_routes(router: &mut Router, state: AppState) {
    let pages = PagesController::new(state.clone());
    let todos = TodoController::new(state);

    let ctrl = pages.clone();
    router.get("/", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.index(req).await }
    });

    let ctrl = pages;
    router.get("/hello", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.hello(req).await }
    });

    let ctrl = todos.clone();
    router.get("/todos", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.list(req).await }
    });

    let ctrl = todos.clone();
    router.post("/todos", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.create(req).await }
    });

    let ctrl = todos.clone();
    router.post("/todos/:id/toggle", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.toggle(req).await }
    });

    let ctrl = todos;
    router.delete("/todos/:id", move |req| {
        let ctrl = ctrl.clone();
        async move { ctrl.delete(req).await }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use hello_htmx_core::HttpMethod;

    #[test]
    fn test_is_htmx() {
        let plain = HttpRequest::new(HttpMethod::GET, "/todos");
        assert!(!is_htmx(&plain));

        let htmx = plain.clone().with_header("HX-Request", "true");
        assert!(is_htmx(&htmx));
    }

    #[test]
    fn test_todo_id_rejects_non_integers() {
        let mut req = HttpRequest::new(HttpMethod::DELETE, "/todos/abc");
        req.path_params.insert("id".to_string(), "abc".to_string());
        assert_eq!(todo_id(&req).unwrap_err().status_code(), 404);

        req.path_params.insert("id".to_string(), "-1".to_string());
        assert!(todo_id(&req).is_err());

        req.path_params.insert("id".to_string(), "42".to_string());
        assert_eq!(todo_id(&req).unwrap(), 42);
    }
}
