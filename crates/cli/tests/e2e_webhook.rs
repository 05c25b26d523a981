//! End-to-end tests: webhook documents through the HTTP gateway into the
//! demo agent and back.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use dialogwire::demo::{self, AWAITING_ANSWER_CONTEXT, GAME_CONTEXT};
use dialogwire::simulate::{SimulateOptions, build_request};
use dialogwire_config::AppConfig;
use dialogwire_gateway::{GatewayState, build_router};

fn router(config: &AppConfig) -> Router {
    let agent = demo::build_agent(config).unwrap();
    build_router(Arc::new(GatewayState::new(&config.gateway, Arc::new(agent))))
}

async fn post(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn request(options: SimulateOptions) -> Value {
    serde_json::to_value(build_request(&options).unwrap()).unwrap()
}

fn context<'a>(response: &'a Value, display_name: &str) -> Option<&'a Value> {
    response["outputContexts"]
        .as_array()?
        .iter()
        .find(|ctx| {
            ctx["name"]
                .as_str()
                .is_some_and(|n| n.ends_with(&format!("/contexts/{display_name}")))
        })
}

#[tokio::test]
async fn trivia_round_over_http() {
    let app = router(&AppConfig::default());

    // Turn 1: start the game.
    let (status, first) = post(
        app.clone(),
        request(SimulateOptions {
            intent: demo::START_TRIVIA_INTENT.into(),
            ..SimulateOptions::default()
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fulfillmentText"], "What is the capital of France?");
    let game = context(&first, GAME_CONTEXT).unwrap();
    assert_eq!(game["lifespanCount"], 99);
    assert_eq!(game["parameters"]["questions_asked"], 1);
    assert_eq!(context(&first, AWAITING_ANSWER_CONTEXT).unwrap()["lifespanCount"], 2);

    // Turn 2: the platform echoes the contexts back with the answer.
    let mut second_request = request(SimulateOptions {
        intent: demo::ANSWER_INTENT.into(),
        params: vec!["answer=paris".into()],
        ..SimulateOptions::default()
    });
    second_request["queryResult"]["outputContexts"] = first["outputContexts"].clone();

    let (status, second) = post(app, second_request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fulfillmentText"], "Correct! Your score is 1.");
    assert_eq!(context(&second, GAME_CONTEXT).unwrap()["parameters"]["score"], 1);
    assert_eq!(
        context(&second, AWAITING_ANSWER_CONTEXT).unwrap()["lifespanCount"],
        0
    );
}

#[tokio::test]
async fn google_payload_round_trip() {
    let app = router(&AppConfig::default());
    let (status, body) = post(
        app,
        request(SimulateOptions {
            intent: demo::WELCOME_INTENT.into(),
            source: Some("google".into()),
            version: Some("2".into()),
            payload: Some(json!({"isInSandbox": true}).to_string()),
            ..SimulateOptions::default()
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let google = &body["payload"]["google"];
    assert_eq!(google["expectUserResponse"], true);
    let items = google["richResponse"]["items"].as_array().unwrap();
    assert_eq!(
        items[0]["simpleResponse"]["ssml"],
        "<speak>Hi! Want to play a round of trivia?</speak>"
    );
    assert_eq!(google["richResponse"]["suggestions"][0]["title"], "Start trivia");
}

#[tokio::test]
async fn plain_text_speech_when_ssml_is_off() {
    let mut config = AppConfig::default();
    config.actions_on_google.text_to_speech_as_ssml = false;

    let (_, body) = post(
        router(&config),
        request(SimulateOptions {
            intent: demo::GOODBYE_INTENT.into(),
            source: Some("google".into()),
            version: Some("2".into()),
            ..SimulateOptions::default()
        }),
    )
    .await;

    let google = &body["payload"]["google"];
    assert_eq!(google["expectUserResponse"], false);
    assert_eq!(
        google["richResponse"]["items"][0]["simpleResponse"]["textToSpeech"],
        "Thanks for playing! Final score: 0."
    );
    assert_eq!(body["endInteraction"], true);
}

#[tokio::test]
async fn templates_from_config_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    std::fs::write(&path, "welcome: Howdy!\n").unwrap();

    let mut config = AppConfig::default();
    config.templates.path = Some(path);

    let (_, body) = post(
        router(&config),
        request(SimulateOptions {
            intent: demo::WELCOME_INTENT.into(),
            ..SimulateOptions::default()
        }),
    )
    .await;
    assert_eq!(body["fulfillmentText"], "Howdy!");
}

#[tokio::test]
async fn undecodable_typed_context_is_400() {
    let mut body = request(SimulateOptions {
        intent: demo::WELCOME_INTENT.into(),
        ..SimulateOptions::default()
    });
    body["queryResult"]["outputContexts"] = json!([{
        "name": "projects/foo/agent/sessions/bar/contexts/trivia_game",
        "parameters": {"score": "lots"}
    }]);

    let (status, body) = post(router(&AppConfig::default()), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "malformed_request");
}

#[tokio::test]
async fn unknown_intent_gets_the_configured_fallback() {
    let mut config = AppConfig::default();
    config.agent.unhandled_intent_text = "Come again?".into();

    let (status, body) = post(
        router(&config),
        request(SimulateOptions {
            intent: "Order Pizza".into(),
            ..SimulateOptions::default()
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fulfillmentText"], "Come again?");
    assert!(context(&body, GAME_CONTEXT).is_some());
}
