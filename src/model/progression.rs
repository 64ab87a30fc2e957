//! Lesson completion and everything it cascades into: enrollment progress,
//! quiz gating, certificate issuance, XP and badges.

use serde::Serialize;
use uuid::Uuid;

use crate::error::log_error;
use crate::model::entity::{
    Badge, Certificate, Course, Enrollment, EnrollmentWithCourseRow, Lesson, LessonProgress, Quiz,
    QuizAttempt, UserBadgeRow, UserEntity, XpReason,
};
use crate::model::gamification::{XpAward, XpRules, award_xp, progress_pct, xp_for_level};
use crate::model::{CrudRepository, ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    InProgress,
    QuizRequired,
    Certified,
}

/// `quiz_passed` is `None` when the course has no quiz.
pub fn course_status(completed: i64, total: i64, quiz_passed: Option<bool>) -> CourseStatus {
    if total == 0 || completed < total {
        return CourseStatus::InProgress;
    }
    match quiz_passed {
        Some(false) => CourseStatus::QuizRequired,
        _ => CourseStatus::Certified,
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Certification {
    pub status: CourseStatus,
    pub certificate: Option<Certificate>,
    /// Only set on the call that issued the certificate.
    pub xp: Option<XpAward>,
}

/// Issues the course certificate once every lesson is done and the gating quiz, if any, is passed.
pub async fn evaluate_certification(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    rules: &XpRules,
    user_id: Uuid,
    course: &Course,
) -> DatabaseResult<Certification> {
    let total = Lesson::count_in_course(mm, actor, course.id()).await?;
    let completed = LessonProgress::count_completed_in_course(mm, actor, user_id, course.id()).await?;

    let quiz_passed = if total > 0 && completed >= total {
        match Quiz::find_by_course(mm, actor, course.id()).await? {
            Some(quiz) => Some(QuizAttempt::has_passed(mm, actor, user_id, quiz.id()).await?),
            None => None,
        }
    } else {
        None
    };

    let status = course_status(completed, total, quiz_passed);
    if status != CourseStatus::Certified {
        return Ok(Certification {
            status,
            certificate: None,
            xp: None,
        });
    }

    let Some(certificate) = Certificate::issue(mm, actor, user_id, course.id()).await? else {
        let existing = Certificate::find_for(mm, actor, user_id, course.id()).await?;
        return Ok(Certification {
            status,
            certificate: existing,
            xp: None,
        });
    };

    tracing::info!(%user_id, course = course.slug(), serial = certificate.serial(), "certificate issued");

    Enrollment::upsert(mm, actor, user_id, course.id()).await?;
    Enrollment::mark_completed(mm, actor, user_id, course.id()).await?;

    let xp = award_xp(
        mm,
        actor,
        user_id,
        XpReason::CourseCompleted,
        course.id(),
        rules.course_reward(course.xp_reward()),
        rules,
    )
    .await?;

    Ok(Certification {
        status,
        certificate: Some(certificate),
        xp,
    })
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LessonCompletion {
    pub lesson_id: Uuid,
    pub newly_completed: bool,
    pub xp_awarded: i64,
    pub progress_pct: i32,
    pub course_status: CourseStatus,
    pub certificate: Option<Certificate>,
    pub xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub badges: Vec<String>,
}

/// `None` when the lesson does not exist or belongs to a course hidden from the actor.
/// Repeating the call is harmless: nothing is granted twice.
pub async fn complete_lesson(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    rules: &XpRules,
    lesson_id: Uuid,
) -> DatabaseResult<Option<LessonCompletion>> {
    let user_id = actor.user_id();

    let Some(lesson) = Lesson::find_by_id(mm, actor, lesson_id).await? else {
        return Ok(None);
    };
    let Some(course_id) = Lesson::course_id_of(mm, actor, lesson_id).await? else {
        return Ok(None);
    };
    let Some(course) = Course::find_by_id(mm, actor, course_id).await? else {
        return Ok(None);
    };
    if !course.visible_to(actor) {
        return Ok(None);
    }

    Enrollment::upsert(mm, actor, user_id, course_id).await?;

    let newly_completed = LessonProgress::record(mm, actor, user_id, lesson_id).await?;

    let mut xp_awarded = 0;
    let mut leveled_up = false;
    if newly_completed {
        let award = award_xp(
            mm,
            actor,
            user_id,
            XpReason::LessonCompleted,
            lesson_id,
            lesson.xp_reward().into(),
            rules,
        )
        .await?;
        if let Some(award) = award {
            xp_awarded += award.awarded;
            leveled_up |= award.leveled_up;
        }
    }

    let total = Lesson::count_in_course(mm, actor, course_id).await?;
    let completed = LessonProgress::count_completed_in_course(mm, actor, user_id, course_id).await?;
    let pct = progress_pct(completed, total);
    Enrollment::set_progress(mm, actor, user_id, course_id, pct).await?;

    let certification = evaluate_certification(mm, actor, rules, user_id, &course).await?;
    if let Some(award) = &certification.xp {
        xp_awarded += award.awarded;
        leveled_up |= award.leveled_up;
    }

    let badges = match Badge::evaluate_for(mm, actor, user_id).await {
        Ok(slugs) => slugs,
        Err(e) => {
            log_error(&e);
            Vec::new()
        }
    };

    let (xp, level) = match UserEntity::find_by_id(mm, actor, user_id).await? {
        Some(user) => (user.xp(), user.level()),
        None => (0, 1),
    };

    Ok(Some(LessonCompletion {
        lesson_id,
        newly_completed,
        xp_awarded,
        progress_pct: if certification.status == CourseStatus::Certified { 100 } else { pct },
        course_status: certification.status,
        certificate: certification.certificate,
        xp,
        level,
        leveled_up,
        badges,
    }))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressSummary {
    pub xp: i64,
    pub level: i32,
    pub next_level_xp: i64,
    pub xp_to_next_level: i64,
    pub lessons_completed: i64,
    pub enrollments: Vec<EnrollmentWithCourseRow>,
    pub certificates: i64,
    pub badges: i64,
}

pub async fn progress_summary(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    rules: &XpRules,
    user: &UserEntity,
) -> DatabaseResult<ProgressSummary> {
    let lessons_completed = LessonProgress::count_completed(mm, actor, user.id()).await?;
    let enrollments = EnrollmentWithCourseRow::fetch_by_user(mm, actor, user.id()).await?;
    let certificates = Certificate::count_by_user(mm, actor, user.id()).await?;
    let badges = UserBadgeRow::fetch_by_user(mm, actor, user.id()).await?.len() as i64;

    let next_level_xp = xp_for_level(user.level().saturating_add(1), rules.level_base_xp);

    Ok(ProgressSummary {
        xp: user.xp(),
        level: user.level(),
        next_level_xp,
        xp_to_next_level: (next_level_xp - user.xp()).max(0),
        lessons_completed,
        enrollments,
        certificates,
        badges,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unfinished_course_is_in_progress() {
        assert_eq!(course_status(0, 0, None), CourseStatus::InProgress);
        assert_eq!(course_status(2, 3, None), CourseStatus::InProgress);
        assert_eq!(course_status(2, 3, Some(true)), CourseStatus::InProgress);
    }

    #[test]
    fn quiz_gates_certificate() {
        assert_eq!(course_status(3, 3, Some(false)), CourseStatus::QuizRequired);
        assert_eq!(course_status(3, 3, Some(true)), CourseStatus::Certified);
    }

    #[test]
    fn course_without_quiz_certifies_on_last_lesson() {
        assert_eq!(course_status(3, 3, None), CourseStatus::Certified);
    }
}
