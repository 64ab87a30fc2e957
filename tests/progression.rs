mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, setup_server, setup_test_db, signin_admin_action, signup_action, stored_field,
};

fn json_of(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid body format")
}

/// Admin steps that publish a course with two lessons and a one-question quiz.
fn seed_course(flow: Flow) -> Flow {
    flow.step(signin_admin_action())
        .step(
            Action::new("create_course", "POST", "/api/v1/admin/courses")
                .with_body(json!({
                    "slug": "rust-101",
                    "title": "Rust 101",
                    "description": "Ownership and borrowing",
                    "xp_reward": 50,
                    "published": true,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("course"),
        )
        .step(
            Action::new("create_module", "POST", "/api/v1/admin/modules")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": stored_field(ctx, "course", "id"),
                        "title": "Basics",
                        "description": "",
                        "order_index": 0,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("module"),
        )
        .step(
            Action::new("create_lesson_1", "POST", "/api/v1/admin/lessons")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": stored_field(ctx, "module", "id"),
                        "title": "Hello",
                        "content": "fn main() {}",
                        "order_index": 0,
                        "xp_reward": 10,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("lesson_1"),
        )
        .step(
            Action::new("create_lesson_2", "POST", "/api/v1/admin/lessons")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": stored_field(ctx, "module", "id"),
                        "title": "Borrowing",
                        "content": "&T and &mut T",
                        "order_index": 1,
                        "xp_reward": 10,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("lesson_2"),
        )
        .step(
            Action::new("create_quiz", "POST", "/api/v1/admin/quizzes")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": stored_field(ctx, "course", "id"),
                        "title": "Final",
                        "pass_score": 100,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("quiz"),
        )
        // one quiz per course
        .step(
            Action::new("create_second_quiz", "POST", "/api/v1/admin/quizzes")
                .with_dyn_body(|ctx| {
                    json!({ "course_id": stored_field(ctx, "course", "id"), "title": "Again" })
                })
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("create_question", "POST", "/api/v1/admin/questions")
                .with_dyn_body(|ctx| {
                    json!({
                        "quiz_id": stored_field(ctx, "quiz", "id"),
                        "question": "Who owns a moved value?",
                        "explanation": "The receiver.",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("question"),
        )
        .step(
            Action::new("create_right_answer", "POST", "/api/v1/admin/answers")
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": stored_field(ctx, "question", "id"),
                        "answer_text": "The receiver",
                        "is_correct": true,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("right"),
        )
        .step(
            Action::new("create_wrong_answer", "POST", "/api/v1/admin/answers")
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": stored_field(ctx, "question", "id"),
                        "answer_text": "Nobody",
                        "is_correct": false,
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("wrong"),
        )
}

fn lesson_done(name: &'static str, lesson_key: &'static str) -> Action {
    Action::new(name, "POST", "dynamic").with_dyn_path(move |ctx| {
        format!("/api/v1/lessons/{}/done", stored_field(ctx, lesson_key, "id"))
    })
}

fn attempt(name: &'static str, answer_key: &'static str) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/attempts", stored_field(ctx, "quiz", "id")))
        .with_dyn_body(move |ctx| {
            json!({
                "answers": [{
                    "question_id": stored_field(ctx, "question", "id"),
                    "answer_id": stored_field(ctx, answer_key, "id"),
                }]
            })
        })
}

#[tokio::test]
async fn course_completion_is_gated_by_quiz() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    seed_course(Flow::new())
        .step(signup_action("learner", "learner-pass").with_clear_cookies(true))
        .step(lesson_done("first_lesson", "lesson_1").assert_body(|body| {
            let res = json_of(body);
            assert_eq!(res["newly_completed"], true);
            assert_eq!(res["xp_awarded"], 10);
            assert_eq!(res["progress_pct"], 50);
            assert_eq!(res["course_status"], "in_progress");
            assert_eq!(res["badges"], json!(["first-steps"]));
        }))
        // repeating grants nothing
        .step(lesson_done("first_lesson_again", "lesson_1").assert_body(|body| {
            let res = json_of(body);
            assert_eq!(res["newly_completed"], false);
            assert_eq!(res["xp_awarded"], 0);
            assert_eq!(res["xp"], 10);
        }))
        .step(lesson_done("second_lesson", "lesson_2").assert_body(|body| {
            let res = json_of(body);
            assert_eq!(res["progress_pct"], 100);
            assert_eq!(res["course_status"], "quiz_required");
            assert!(res["certificate"].is_null());
        }))
        .step(attempt("failed_attempt", "wrong").assert_body(|body| {
            let res = json_of(body);
            assert_eq!(res["score"], 0);
            assert_eq!(res["passed"], false);
            assert_eq!(res["results"][0]["correct"], false);
            assert!(res["certificate"].is_null());
        }))
        .step(attempt("passing_attempt", "right").assert_body(|body| {
            let res = json_of(body);
            assert_eq!(res["score"], 100);
            assert_eq!(res["passed"], true);
            assert_eq!(res["course_status"], "certified");
            let serial = res["certificate"]["serial"].as_str().expect("serial");
            assert!(serial.starts_with("CERT-"));
        }))
        .step(
            Action::new("my_certificates", "GET", "/api/v1/certificates/mine")
                .with_save_as("certificates")
                .assert_body(|body| {
                    let res = json_of(body);
                    assert_eq!(res.as_array().map(Vec::len), Some(1));
                    assert_eq!(res[0]["course_title"], "Rust 101");
                }),
        )
        .step(
            Action::new("verify_certificate", "GET", "dynamic")
                .with_clear_cookies(true)
                .with_dyn_path(|ctx| {
                    let serial = ctx.get("certificates")[0]["serial"].as_str().unwrap_or_default().to_string();
                    format!("/api/v1/certificates/verify/{}", serial.to_lowercase())
                })
                .assert_body(|body| assert_eq!(json_of(body)["holder_name"], "learner")),
        )
        .step(
            Action::new("verify_unknown", "GET", "/api/v1/certificates/verify/CERT-20000101-00000000")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn progress_summary_and_leaderboard() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    seed_course(Flow::new())
        .step(signup_action("learner", "learner-pass").with_clear_cookies(true))
        .step(lesson_done("first_lesson", "lesson_1"))
        .step(lesson_done("second_lesson", "lesson_2"))
        .step(attempt("passing_attempt", "right"))
        .step(
            Action::new("summary", "GET", "/api/v1/account/me/progress").assert_body(|body| {
                let res = json_of(body);
                // two lessons plus the course reward
                assert_eq!(res["xp"], 70);
                assert_eq!(res["level"], 1);
                assert_eq!(res["next_level_xp"], 100);
                assert_eq!(res["xp_to_next_level"], 30);
                assert_eq!(res["lessons_completed"], 2);
                assert_eq!(res["certificates"], 1);
                assert_eq!(res["enrollments"][0]["progress_pct"], 100);
            }),
        )
        .step(
            Action::new("my_badges", "GET", "/api/v1/badges/mine").assert_body(|body| {
                assert!(body.contains("first-steps"));
                assert!(body.contains("graduate"));
            }),
        )
        .step(signup_action("idle", "idle-pass-1").with_clear_cookies(true))
        .step(
            Action::new("leaderboard", "GET", "/api/v1/progress/leaderboard")
                .with_param("limit", "1")
                .assert_body(|body| {
                    let res = json_of(body);
                    assert_eq!(res.as_array().map(Vec::len), Some(1));
                    assert_eq!(res[0]["rank"], 1);
                    assert_eq!(res[0]["xp"], 70);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn catalog_hides_unpublished_courses() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(
            Action::new("create_draft", "POST", "/api/v1/admin/courses")
                .with_body(json!({ "slug": "draft", "title": "Draft", "description": "" }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("draft"),
        )
        .step(
            Action::new("admin_sees_draft", "GET", "/api/v1/courses/")
                .assert_body(|body| assert!(body.contains("draft"))),
        )
        .step(signup_action("student", "student-pass").with_clear_cookies(true))
        .step(
            Action::new("catalog", "GET", "/api/v1/courses/")
                .assert_body(|body| assert!(!body.contains("draft"))),
        )
        .step(
            Action::new("enroll_draft", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_field(ctx, "draft", "id")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("non_admin_create", "POST", "/api/v1/admin/courses")
                .with_body(json!({ "slug": "nope", "title": "Nope", "description": "" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_xp_grants_keep_level_in_step() {
    use campus::model::entity::XpReason;
    use campus::model::gamification::{XpRules, award_xp, level_for_xp};
    use campus::model::{DbConnection, ModelManager};
    use campus::web::AuthenticatedUser;

    let Some(pool) = setup_test_db().await else {
        return;
    };
    let server = setup_server(&pool).await;
    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let rules = XpRules {
        course_xp_bonus: 100,
        level_base_xp: 100,
    };

    for round in 0..10 {
        let username = format!("grinder-{round}");
        let created = server
            .post("/api/v1/account/signup")
            .json(&json!({ "username": username, "password": "grinder-pass" }))
            .await;
        created.assert_status_ok();
        let user_id: uuid::Uuid = created.json::<Value>()["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("signup returns the user id");

        let grants = (0..8).map(|_| {
            let mm = mm.clone();
            tokio::spawn(async move {
                award_xp(
                    &mm,
                    &AuthenticatedUser::admin(),
                    user_id,
                    XpReason::LessonCompleted,
                    uuid::Uuid::new_v4(),
                    150,
                    &rules,
                )
                .await
            })
        });
        for grant in grants.collect::<Vec<_>>() {
            assert!(grant.await.unwrap().unwrap().is_some());
        }

        let (xp, level): (i64, i32) = sqlx::query_as("SELECT xp, level FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool.pool())
            .await
            .unwrap();
        assert_eq!(xp, 1200);
        assert_eq!(level, level_for_xp(xp, rules.level_base_xp));
        assert_eq!(level, 4);
    }
}

#[tokio::test]
async fn certificate_issue_skips_taken_serial() {
    use campus::model::entity::{Certificate, certificate_serial};
    use campus::model::{DbConnection, ModelManager};
    use campus::web::AuthenticatedUser;

    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let (holder, learner, course) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

    for (id, name) in [(holder, "holder"), (learner, "learner")] {
        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, 'x')")
            .bind(id)
            .bind(name)
            .execute(pool.pool())
            .await
            .unwrap();
    }
    sqlx::query("INSERT INTO courses (id, slug, title, published) VALUES ($1, 'serials', 'Serials', TRUE)")
        .bind(course)
        .execute(pool.pool())
        .await
        .unwrap();

    let taken = uuid::Uuid::new_v4();
    let fresh = uuid::Uuid::new_v4();
    sqlx::query("INSERT INTO certificates (id, user_id, course_id, serial) VALUES ($1, $2, $3, $4)")
        .bind(uuid::Uuid::new_v4())
        .bind(holder)
        .bind(course)
        .bind(certificate_serial(chrono::Utc::now(), taken))
        .execute(pool.pool())
        .await
        .unwrap();

    let admin = AuthenticatedUser::admin();
    let issued = Certificate::issue_with_ids(&mm, &admin, learner, course, &[taken, fresh])
        .await
        .unwrap()
        .expect("certificate issued");
    assert_eq!(issued.id(), fresh);
    assert_eq!(issued.serial(), certificate_serial(*issued.issued_at(), fresh));

    // only the taken id available: the collision surfaces as an error
    let other = uuid::Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, 'other', 'x')")
        .bind(other)
        .execute(pool.pool())
        .await
        .unwrap();
    let err = Certificate::issue_with_ids(&mm, &admin, other, course, &[taken])
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[tokio::test]
async fn next_lesson_finishes_a_module_before_moving_on() {
    use campus::model::entity::LessonWithStatusRow;
    use campus::model::{DbConnection, ModelManager};
    use campus::web::AuthenticatedUser;
    use uuid::Uuid;

    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let course = Uuid::from_u128(1);
    // both modules share order_index 0
    let (first, second) = (Uuid::from_u128(2), Uuid::from_u128(3));
    let (a0, a1, b0, b1) = (
        Uuid::from_u128(10),
        Uuid::from_u128(40),
        Uuid::from_u128(20),
        Uuid::from_u128(30),
    );

    sqlx::query("INSERT INTO courses (id, slug, title, published) VALUES ($1, 'ties', 'Ties', TRUE)")
        .bind(course)
        .execute(pool.pool())
        .await
        .unwrap();
    for module in [first, second] {
        sqlx::query("INSERT INTO modules (id, course_id, title, order_index) VALUES ($1, $2, 'M', 0)")
            .bind(module)
            .bind(course)
            .execute(pool.pool())
            .await
            .unwrap();
    }
    for (lesson, module, order) in [(a0, first, 0), (a1, first, 1), (b0, second, 0), (b1, second, 1)] {
        sqlx::query("INSERT INTO lessons (id, module_id, title, order_index) VALUES ($1, $2, 'L', $3)")
            .bind(lesson)
            .bind(module)
            .bind(order)
            .execute(pool.pool())
            .await
            .unwrap();
    }

    let admin = AuthenticatedUser::admin();
    let mut walked = vec![a0];
    while let Some(next) = LessonWithStatusRow::find_next_uncompleted(&mm, &admin, walked[walked.len() - 1])
        .await
        .unwrap()
    {
        walked.push(next.id);
    }
    assert_eq!(walked, vec![a0, a1, b0, b1]);
}
