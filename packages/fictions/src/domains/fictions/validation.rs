//! Form validation for fiction title and body.

use crate::common::ValidationErrors;
use crate::domains::components::models::ComponentSettings;

pub const TITLE_MIN: usize = 15;
pub const TITLE_MAX: usize = 150;
pub const BODY_MIN: usize = 15;

/// Lengths are counted in characters, after trimming.
pub fn validate_fiction(settings: &ComponentSettings, title: &str, body: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let title_len = title.trim().chars().count();
    if title_len == 0 {
        errors.add("title", "can't be blank");
    } else if title_len < TITLE_MIN {
        errors.add("title", format!("is too short (minimum is {} characters)", TITLE_MIN));
    } else if title_len > TITLE_MAX {
        errors.add("title", format!("is too long (maximum is {} characters)", TITLE_MAX));
    }

    let body_len = body.trim().chars().count();
    let body_max = settings.fiction_length as usize;
    if body_len == 0 {
        errors.add("body", "can't be blank");
    } else if body_len < BODY_MIN {
        errors.add("body", format!("is too short (minimum is {} characters)", BODY_MIN));
    } else if body_max > 0 && body_len > body_max {
        errors.add("body", format!("is too long (maximum is {} characters)", body_max));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_bounds() {
        let settings = ComponentSettings::default();
        let title = "t".repeat(TITLE_MIN);
        let body = "b".repeat(settings.fiction_length as usize);
        assert!(validate_fiction(&settings, &title, &body).is_empty());

        let title = "t".repeat(TITLE_MAX);
        assert!(validate_fiction(&settings, &title, &body).is_empty());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let settings = ComponentSettings {
            fiction_length: 20,
            ..Default::default()
        };
        let errors = validate_fiction(&settings, "Too short", &"b".repeat(21));
        assert_eq!(errors.on("title").len(), 1);
        assert_eq!(errors.on("body"), ["is too long (maximum is 20 characters)".to_string()]);

        let errors = validate_fiction(&settings, &"t".repeat(TITLE_MAX + 1), "   ");
        assert!(errors.on("title")[0].starts_with("is too long"));
        assert_eq!(errors.on("body"), ["can't be blank".to_string()]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let settings = ComponentSettings::default();
        let title = "é".repeat(TITLE_MIN);
        assert!(validate_fiction(&settings, &title, &"ü".repeat(BODY_MIN)).is_empty());
    }
}
