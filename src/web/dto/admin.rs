use crate::model::entity::{BadgeCreate, CourseCreate, QuizCreate};
use crate::web::{WebError, WebResult};

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 64
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn require_text(field: &'static str, value: &str, max: usize) -> WebResult<()> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(WebError::invalid_field(field, format!("must be 1 to {max} characters")));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> WebResult<()> {
    require_text("title", title, 200)
}

pub fn validate_course(data: &CourseCreate) -> WebResult<()> {
    if !is_valid_slug(&data.slug) {
        return Err(WebError::invalid_field("slug", "lowercase letters, digits and dashes only"));
    }
    validate_title(&data.title)?;
    if data.xp_reward.is_some_and(|xp| xp < 0) {
        return Err(WebError::invalid_field("xp_reward", "cannot be negative"));
    }
    Ok(())
}

pub fn validate_quiz(data: &QuizCreate) -> WebResult<()> {
    validate_title(&data.title)?;
    if data.pass_score.is_some_and(|s| !(0..=100).contains(&s)) {
        return Err(WebError::invalid_field("pass_score", "must be between 0 and 100"));
    }
    Ok(())
}

pub fn validate_badge(data: &BadgeCreate) -> WebResult<()> {
    if !is_valid_slug(&data.slug) {
        return Err(WebError::invalid_field("slug", "lowercase letters, digits and dashes only"));
    }
    validate_title(&data.title)?;
    if data.threshold.is_some_and(|t| t < 0) {
        return Err(WebError::invalid_field("threshold", "cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::entity::BadgeCriteria;

    #[test]
    fn slugs() {
        assert!(is_valid_slug("rust-101"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Rust"));
        assert!(!is_valid_slug("-rust"));
        assert!(!is_valid_slug("rust 101"));
    }

    #[test]
    fn quiz_pass_score_bounds() {
        let quiz = |pass_score| QuizCreate {
            course_id: uuid::Uuid::new_v4(),
            title: String::from("Final"),
            pass_score,
        };
        assert!(validate_quiz(&quiz(None)).is_ok());
        assert!(validate_quiz(&quiz(Some(100))).is_ok());
        assert!(validate_quiz(&quiz(Some(101))).is_err());
        assert!(validate_quiz(&quiz(Some(-1))).is_err());
    }

    #[test]
    fn badge_rules() {
        let badge = BadgeCreate {
            slug: String::from("ten-lessons"),
            title: String::from("Ten lessons"),
            description: String::new(),
            criteria: BadgeCriteria::LessonsCompleted,
            threshold: Some(10),
        };
        assert!(validate_badge(&badge).is_ok());
        assert!(validate_badge(&BadgeCreate { threshold: Some(-1), ..badge }).is_err());
    }
}
