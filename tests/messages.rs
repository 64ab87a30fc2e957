mod common;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, setup_server, setup_test_db, signin_action, signup_action, stored_field,
};

fn send(name: &'static str, to_key: &'static str, body: &'static str) -> Action {
    Action::new(name, "POST", "/api/v1/messages/").with_dyn_body(move |ctx| {
        json!({ "recipient_id": stored_field(ctx, to_key, "id"), "body": body })
    })
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid body format")
}

#[tokio::test]
async fn messaging_inbox_and_read_state() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("alice", "alice-pass").with_save_cookies(false).with_save_as("alice"))
        .step(signup_action("bob", "bob-password").with_save_as("bob"))
        .step(send("to_self", "bob", "hi me").with_expect(StatusCode::BAD_REQUEST))
        .step(send("blank", "alice", "   ").with_expect(StatusCode::BAD_REQUEST))
        .step(
            Action::new("unknown_recipient", "POST", "/api/v1/messages/")
                .with_body(json!({
                    "recipient_id": "00000000-0000-4000-8000-00000000beef",
                    "body": "hello?",
                }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            send("first", "alice", "  hi alice  ")
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| assert_eq!(parse(body)["body"], "hi alice")),
        )
        .step(send("second", "alice", "are you there?").with_expect(StatusCode::CREATED))
        .step(signin_action("alice", "alice-pass").with_clear_cookies(true))
        .step(
            Action::new("inbox_unread", "GET", "/api/v1/messages/inbox").assert_body(|body| {
                let res = parse(body);
                assert_eq!(res.as_array().map(Vec::len), Some(1));
                assert_eq!(res[0]["partner_name"], "bob");
                assert_eq!(res[0]["last_body"], "are you there?");
                assert_eq!(res[0]["unread"], 2);
            }),
        )
        .step(
            Action::new("conversation", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/messages/conversation/{}", stored_field(ctx, "bob", "id"))
                })
                .assert_body(|body| {
                    let res = parse(body);
                    assert_eq!(res[0]["body"], "hi alice");
                    assert_eq!(res[1]["body"], "are you there?");
                }),
        )
        .step(
            Action::new("inbox_read", "GET", "/api/v1/messages/inbox")
                .assert_body(|body| assert_eq!(parse(body)[0]["unread"], 0)),
        )
        .step(send("reply", "bob", "yes!").with_expect(StatusCode::CREATED))
        .step(
            Action::new("inbox_after_reply", "GET", "/api/v1/messages/inbox")
                .assert_body(|body| assert_eq!(parse(body)[0]["last_body"], "yes!")),
        )
        .step(
            Action::new("anonymous_inbox", "GET", "/api/v1/messages/inbox")
                .with_clear_cookies(true)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}
