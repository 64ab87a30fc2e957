mod common;
use campus::model::{DbConnection, ModelManager};
use campus::worker::run_maintenance;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, setup_server, setup_test_db, signin_action, signin_admin_action, signup_action,
    stored_field,
};

fn proposal_path(suffix: &'static str) -> impl Fn(&common::FlowContext) -> String {
    move |ctx| format!("/api/v1/proposals/{}{}", stored_field(ctx, "proposal", "id"), suffix)
}

fn vote(name: &'static str, choice: &'static str) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(proposal_path("/vote"))
        .with_body(json!({ "choice": choice }))
}

#[tokio::test]
async fn proposal_lifecycle_and_voting() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("voter-one", "voter-one-pass").with_save_cookies(false))
        .step(signup_action("author", "author-pass"))
        .step(
            Action::new("too_short", "POST", "/api/v1/proposals/")
                .with_body(json!({ "title": "Go", "body": "please" }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("create", "POST", "/api/v1/proposals/")
                .with_body(json!({ "title": "Add a Go track", "body": "We want Go." }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("proposal")
                .assert_body(|body| assert!(body.contains("\"pending\""))),
        )
        // pending proposals do not take votes
        .step(vote("vote_pending", "for").with_expect(StatusCode::BAD_REQUEST))
        // moderation is admin only
        .step(
            Action::new("validate_as_user", "POST", "dynamic")
                .with_dyn_path(proposal_path("/validate"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("close_pending", "POST", "dynamic")
                .with_dyn_path(proposal_path("/close"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("validate", "POST", "dynamic")
                .with_dyn_path(proposal_path("/validate"))
                .assert_body(|body| {
                    let res: Value = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(res["proposal"]["status"], "open");
                    assert!(res["proposal"]["closes_at"].is_string());
                    assert!(res["outcome"].is_null());
                }),
        )
        .step(
            Action::new("validate_twice", "POST", "dynamic")
                .with_dyn_path(proposal_path("/validate"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(signin_action("author", "author-pass").with_clear_cookies(true))
        .step(vote("author_against", "against"))
        // re-voting replaces the earlier choice
        .step(vote("author_for", "for").assert_body(|body| {
            let res: Value = serde_json::from_str(body).expect("Invalid body format");
            assert_eq!(res["tally"]["votes_for"], 1);
            assert_eq!(res["tally"]["votes_against"], 0);
        }))
        .step(signin_action("voter-one", "voter-one-pass").with_clear_cookies(true))
        .step(vote("voter_abstain", "abstain"))
        .step(
            Action::new("list_open", "GET", "/api/v1/proposals/")
                .with_param("status", "open")
                .assert_body(|body| assert!(body.contains("Add a Go track"))),
        )
        .step(
            Action::new("list_rejected", "GET", "/api/v1/proposals/")
                .with_param("status", "rejected")
                .assert_body(|body| assert_eq!(body, "[]")),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("close", "POST", "dynamic")
                .with_dyn_path(proposal_path("/close"))
                .assert_body(|body| {
                    let res: Value = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(res["proposal"]["status"], "closed");
                    assert_eq!(res["tally"]["votes_abstain"], 1);
                    assert_eq!(res["outcome"], "accepted");
                }),
        )
        .step(vote("vote_closed", "for").with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn rejected_proposal_is_final() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("author", "author-pass"))
        .step(
            Action::new("create", "POST", "/api/v1/proposals/")
                .with_body(json!({ "title": "Drop tabs", "body": "Spaces only." }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("proposal"),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("reject", "POST", "dynamic")
                .with_dyn_path(proposal_path("/reject"))
                .assert_body(|body| assert!(body.contains("\"rejected\""))),
        )
        .step(
            Action::new("validate_rejected", "POST", "dynamic")
                .with_dyn_path(proposal_path("/validate"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("missing", "GET", "/api/v1/proposals/00000000-0000-4000-8000-00000000beef")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn maintenance_closes_expired_proposals() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    server
        .post("/api/v1/account/signup")
        .json(&json!({ "username": "author", "password": "author-pass" }))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/proposals/")
        .json(&json!({ "title": "Weekly streams", "body": "On Fridays." }))
        .await
        .assert_status(StatusCode::CREATED);

    sqlx::query("UPDATE proposals SET status = 'open', closes_at = now() - interval '1 minute'")
        .execute(pool.pool())
        .await
        .unwrap();

    let mm = ModelManager::new(DbConnection::from_pool(pool.pool().clone()));
    let report = run_maintenance(&mm).await;
    assert_eq!(report.closed_proposals, 1);

    let status: String = sqlx::query_scalar("SELECT status FROM proposals")
        .fetch_one(pool.pool())
        .await
        .unwrap();
    assert_eq!(status, "closed");

    // nothing left to close
    assert_eq!(run_maintenance(&mm).await.closed_proposals, 0);
}

#[tokio::test]
async fn proposal_lists_are_capped() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;
    server.save_cookies();

    server
        .post("/api/v1/account/signup")
        .json(&json!({ "username": "prolific", "password": "prolific-pass" }))
        .await
        .assert_status_ok();

    sqlx::query(
        r#"
        INSERT INTO proposals (id, author_id, title, body)
        SELECT gen_random_uuid(), u.id, 'Idea ' || n, 'Details'
        FROM users u, generate_series(1, 105) AS n
        WHERE u.username = 'prolific'
        "#,
    )
    .execute(pool.pool())
    .await
    .unwrap();

    for path in ["/api/v1/proposals/", "/api/v1/proposals/?status=pending"] {
        let listed = server.get(path).await;
        listed.assert_status_ok();
        assert_eq!(listed.json::<Value>().as_array().map(Vec::len), Some(100), "{path}");
    }
}
