//! Normalization of server-side validation messages
//!
//! Schema validators report failures as `body/<field> <reason>`. These are
//! rewritten into something presentable: the `body/` prefix is dropped and the
//! field name becomes a capitalized label.

const VALIDATION_PREFIX: &str = "body/";

/// Rewrite a `body/<field> ...` validation message for display.
///
/// Messages without the `body/` prefix are returned unchanged.
///
/// ```
/// use minifetch::normalize_error_message;
///
/// assert_eq!(normalize_error_message("body/user must be present"), "User/Email must be present");
/// assert_eq!(normalize_error_message("Invalid credentials"), "Invalid credentials");
/// ```
pub fn normalize_error_message(message: &str) -> String {
    let Some(rest) = message.strip_prefix(VALIDATION_PREFIX) else {
        return message.to_string();
    };

    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (field, tail) = rest.split_at(end);

    format!("{}{}", field_label(field), tail)
}

fn field_label(field: &str) -> String {
    match field {
        // login identifier accepts either form
        "user" => "User/Email".to_string(),
        "pwd" => "Password".to_string(),
        _ => capitalize(field),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
