use chrono::{Datelike, Utc};
use rocket_dyn_templates::Template;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::error;
use validator::ValidationErrors;
use yatube_models::users::User;

/// Renders `name` with `ctx`, plus what every page needs: the current user and year.
pub fn render<C: Serialize>(name: &'static str, user: Option<&User>, ctx: C) -> Template {
    Template::render(name, Value::Object(with_base(user, ctx)))
}

fn with_base<C: Serialize>(user: Option<&User>, ctx: C) -> Map<String, Value> {
    let mut context = match serde_json::to_value(ctx) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            let mut map = Map::new();
            map.insert("data".to_owned(), other);
            map
        }
        Err(e) => {
            error!("Couldn't serialize a template context: {}", e);
            Map::new()
        }
    };
    context.insert("user".to_owned(), json!(user));
    context.insert("year".to_owned(), json!(Utc::now().year()));
    context
}

/// Messages of a failed validation, by field. Errors of the whole form are under `__all__`.
pub fn form_errors(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_owned(), messages)
        })
        .collect()
}

/// A single error, for checks made outside of the validator.
pub fn field_error(field: &str, message: &str) -> HashMap<String, Vec<String>> {
    let mut errors = HashMap::new();
    errors.insert(field.to_owned(), vec![message.to_owned()]);
    errors
}
