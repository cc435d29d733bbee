//! Shared field validation rules
//!
//! One rule table consumed by both the API layer and the client, so the two
//! sides cannot drift apart. Rules are explicit data (field, bounds, message)
//! consumed by a generic length validator; lengths are counted in characters,
//! not bytes, and values are trimmed before checking.

/// Length constraint for a single text field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub min_chars: usize,
    pub max_chars: usize,
    pub message: &'static str,
}

pub const TITLE_RULE: FieldRule = FieldRule {
    field: "title",
    min_chars: 3,
    max_chars: 50,
    message: "title must be between 3 and 50 characters",
};

pub const DESCRIPTION_RULE: FieldRule = FieldRule {
    field: "description",
    min_chars: 10,
    max_chars: 200,
    message: "description must be between 10 and 200 characters",
};

impl FieldRule {
    /// Check a value against this rule. The value is trimmed first; an empty
    /// trimmed value and an out-of-bounds length both fail with the rule's
    /// message.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(format!("{} must not be empty", self.field));
        }
        let len = trimmed.chars().count();
        if len < self.min_chars || len > self.max_chars {
            return Err(self.message.to_string());
        }
        Ok(())
    }
}

/// Validate the fields of a new item. Both fields are required.
pub fn validate_new_item(title: &str, description: &str) -> Result<(), Vec<String>> {
    let mut messages = Vec::new();
    if let Err(msg) = TITLE_RULE.check(title) {
        messages.push(msg);
    }
    if let Err(msg) = DESCRIPTION_RULE.check(description) {
        messages.push(msg);
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(messages)
    }
}

/// Validate the fields of an item update. Only provided fields are checked.
pub fn validate_item_update(
    title: Option<&str>,
    description: Option<&str>,
) -> Result<(), Vec<String>> {
    let mut messages = Vec::new();
    if let Some(title) = title {
        if let Err(msg) = TITLE_RULE.check(title) {
            messages.push(msg);
        }
    }
    if let Some(description) = description {
        if let Err(msg) = DESCRIPTION_RULE.check(description) {
            messages.push(msg);
        }
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(messages)
    }
}
