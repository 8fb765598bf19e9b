//! Page composition and rendering.
//!
//! Every page is rendered from a [`PageContext`]: the application title, the
//! visitor's user id and, for a logged-in visitor, their account details and
//! lists with nested tasks, read fresh from the database on each render.
//!
//! A view renders either on its own ([`RenderMode::Partial`], for htmx swaps)
//! or wrapped in `layouts/main.html` ([`RenderMode::Full`]).

use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use tera::{Context, Tera};

use crate::db::Database;
use crate::error::AppError;
use crate::models::{List, ListId, Task, TaskId, UserId};

/// Request header sent by htmx on every request it issues.
pub const HX_REQUEST: &str = "HX-Request";
/// Response header telling htmx to navigate to another page.
pub const HX_REDIRECT: &str = "HX-Redirect";

const LAYOUT: &str = "layouts/main.html";

const TEMPLATES: [(&str, &str); 6] = [
    (LAYOUT, include_str!("../templates/layouts/main.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("todo.html", include_str!("../templates/todo.html")),
    (
        "partials/menus-list.html",
        include_str!("../templates/partials/menus-list.html"),
    ),
];

/// Templates a handler can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Index,
    Login,
    Register,
    Todo,
    /// The list-of-lists fragment swapped in after a list is added or removed.
    ListsPartial,
}

impl View {
    pub fn template(self) -> &'static str {
        match self {
            View::Index => "index.html",
            View::Login => "login.html",
            View::Register => "register.html",
            View::Todo => "todo.html",
            View::ListsPartial => "partials/menus-list.html",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Wrapped in the page layout.
    Full,
    /// The bare fragment.
    Partial,
}

/// Everything a template may read.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub title: String,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub lists: Vec<ListView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub id: ListId,
    pub title: String,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub completed: bool,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            completed: task.completed,
        }
    }
}

impl ListView {
    fn new(list: List, tasks: Vec<Task>) -> Self {
        Self {
            id: list.id,
            title: list.title,
            tasks: tasks.into_iter().map(TaskView::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct LayoutContext<'a> {
    #[serde(flatten)]
    page: &'a PageContext,
    content: String,
}

/// Renders views for one application title.
#[derive(Debug)]
pub struct ViewComposer {
    tera: Tera,
    title: String,
}

impl ViewComposer {
    pub fn new(title: impl Into<String>) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self {
            tera,
            title: title.into(),
        })
    }

    /// Builds the context for `user`. A user id that no longer resolves to
    /// an account is logged and rendered as anonymous.
    pub async fn compose(
        &self,
        db: &Database,
        user: Option<UserId>,
    ) -> Result<PageContext, AppError> {
        let mut page = PageContext {
            title: self.title.clone(),
            user_id: None,
            username: None,
            email: None,
            lists: Vec::new(),
        };

        let Some(user_id) = user else {
            return Ok(page);
        };
        let Some(account) = db.find_user_by_id(user_id).await? else {
            log::warn!("Session refers to missing user {}", user_id);
            return Ok(page);
        };

        for list in db.lists_by_user(account.id).await? {
            let tasks = db.tasks_by_list(list.id).await?;
            page.lists.push(ListView::new(list, tasks));
        }
        page.user_id = Some(account.id);
        page.username = Some(account.username);
        page.email = Some(account.email);
        Ok(page)
    }

    /// Renders an already composed page.
    pub fn render_page(
        &self,
        view: View,
        page: &PageContext,
        mode: RenderMode,
    ) -> Result<String, AppError> {
        let content = self
            .tera
            .render(view.template(), &Context::from_serialize(page)?)?;
        match mode {
            RenderMode::Partial => Ok(content),
            RenderMode::Full => {
                let layout = LayoutContext { page, content };
                Ok(self.tera.render(LAYOUT, &Context::from_serialize(&layout)?)?)
            }
        }
    }

    pub async fn render(
        &self,
        db: &Database,
        view: View,
        user: Option<UserId>,
        mode: RenderMode,
    ) -> Result<String, AppError> {
        let page = self.compose(db, user).await?;
        self.render_page(view, &page, mode)
    }

    /// `200 text/html` with the rendered view.
    pub async fn respond(
        &self,
        db: &Database,
        view: View,
        user: Option<UserId>,
        mode: RenderMode,
    ) -> Result<HttpResponse, AppError> {
        let html = self.render(db, view, user, mode).await?;
        Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html))
    }

    /// Sends the visitor to `target`.
    ///
    /// htmx requests get `200` with an `HX-Redirect` header, since htmx
    /// cannot follow a plain redirect without a full reload. Other requests
    /// get the target's `view` rendered in place.
    pub async fn redirect(
        &self,
        db: &Database,
        req: &HttpRequest,
        view: View,
        target: &str,
        user: Option<UserId>,
    ) -> Result<HttpResponse, AppError> {
        if is_htmx(req) {
            return Ok(HttpResponse::Ok()
                .insert_header((HX_REDIRECT, target))
                .finish());
        }
        self.respond(db, view, user, RenderMode::Full).await
    }
}

/// Whether `req` was issued by htmx.
pub fn is_htmx(req: &HttpRequest) -> bool {
    req.headers()
        .get(HX_REQUEST)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value == "true")
}
