//! Template engine for user-facing notification texts (Jinja2 syntax).
//!
//! Templates live under `templates/notifications/` and are embedded at
//! compile time. The first rendered line is the title, the rest the message.

use minijinja::{Environment, Value};
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    (
        "notifications/note_approved.jinja",
        include_str!("../../templates/notifications/note_approved.jinja"),
    ),
    (
        "notifications/note_rejected.jinja",
        include_str!("../../templates/notifications/note_rejected.jinja"),
    ),
    (
        "notifications/note_deleted.jinja",
        include_str!("../../templates/notifications/note_deleted.jinja"),
    ),
    (
        "notifications/delete_request_resolved.jinja",
        include_str!("../../templates/notifications/delete_request_resolved.jinja"),
    ),
    (
        "notifications/moderator_request_resolved.jinja",
        include_str!("../../templates/notifications/moderator_request_resolved.jinja"),
    ),
    (
        "notifications/role_changed.jinja",
        include_str!("../../templates/notifications/role_changed.jinja"),
    ),
    (
        "notifications/account_status_changed.jinja",
        include_str!("../../templates/notifications/account_status_changed.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }
    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

pub fn render_template(template_name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

/// Render a template and split it into `(title, message)`
pub fn render_title_and_message(
    template_name: &str,
    ctx: Value,
) -> Result<(String, String), TemplateError> {
    let rendered = render_template(template_name, ctx)?;
    let (title, message) = rendered.split_once('\n').unwrap_or((rendered.as_str(), ""));
    Ok((title.trim().to_string(), message.trim().to_string()))
}
