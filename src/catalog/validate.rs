use super::models::{CourseContent, ProposalFields};
use crate::config::Limits;
use crate::errors::{CatalogError, CatalogResult};

/// Title required, every field within its configured bound. Lengths are
/// counted in characters after trimming.
pub fn proposal_fields(fields: &ProposalFields, limits: &Limits) -> CatalogResult<()> {
    check_named(&fields.named(), limits)
}

pub fn course_content(content: &CourseContent, limits: &Limits) -> CatalogResult<()> {
    check_named(&content.named(), limits)
}

fn check_named(named: &[(&'static str, &str)], limits: &Limits) -> CatalogResult<()> {
    for (name, value) in named {
        let value = value.trim();
        let max = if *name == "title" {
            if value.is_empty() {
                return Err(CatalogError::Validation("title is required".to_string()));
            }
            limits.title_max
        } else {
            limits.text_max
        };
        let len = value.chars().count();
        if len > max {
            return Err(CatalogError::Validation(format!(
                "{} is too long ({} > {} characters)",
                name, len, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits {
            title_max: 10,
            text_max: 20,
        }
    }

    #[test]
    fn test_title_required() {
        let fields = ProposalFields {
            title: "   ".into(),
            ..Default::default()
        };
        let err = proposal_fields(&fields, &limits()).unwrap_err();
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn test_other_fields_may_be_empty() {
        let fields = ProposalFields {
            title: "Rust".into(),
            ..Default::default()
        };
        assert!(proposal_fields(&fields, &limits()).is_ok());
    }

    #[test]
    fn test_length_bounds() {
        let long_title = ProposalFields {
            title: "x".repeat(11),
            ..Default::default()
        };
        assert!(proposal_fields(&long_title, &limits()).is_err());

        let long_outline = ProposalFields {
            title: "ok".into(),
            outline: "y".repeat(21),
            ..Default::default()
        };
        let err = proposal_fields(&long_outline, &limits()).unwrap_err();
        assert!(err.to_string().contains("outline"));
    }

    #[test]
    fn test_bounds_count_characters_after_trim() {
        let fields = ProposalFields {
            title: format!("  {}  ", "é".repeat(10)),
            ..Default::default()
        };
        assert!(proposal_fields(&fields, &limits()).is_ok());
    }

    #[test]
    fn test_course_content() {
        let content = CourseContent {
            title: "SQL".into(),
            summary: "z".repeat(21),
            ..Default::default()
        };
        assert!(course_content(&content, &limits()).is_err());
        assert!(course_content(&CourseContent::default(), &limits()).is_err());
    }
}
