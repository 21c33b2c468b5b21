//! Drives the router end to end over in-memory storage.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use api::state::AppState;
use shared::config::Config;
use shared::services::auth_service::AuthServiceTrait;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "RNG_SEED" => Some("42".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_config(&config).await;
        TestApp {
            router: api::app(state.clone()),
            state,
        }
    }

    fn token(&self, user_id: &str) -> String {
        self.state.auth_service.generate_token(user_id).unwrap().token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            request = request.header("Authorization", format!("Bearer {}", self.token(user_id)));
        }
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn started_room(&self, game_type: &str) -> Value {
        let (status, room) = self
            .send(Method::POST, "/rooms", Some("alice"), Some(json!({ "game_type": game_type })))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/rooms/code/{}/join", room["room_code"].as_str().unwrap());
        let (status, room) = self.send(Method::POST, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        room
    }
}

fn cell(row: usize, col: usize) -> Value {
    json!({ "game_type": "tictactoe", "row": row, "col": col })
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn room_routes_require_a_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/rooms", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn tictactoe_match_over_http() {
    let app = TestApp::new().await;
    let room = app.started_room("tictactoe").await;
    let moves_uri = format!("/rooms/{}/moves", room["id"].as_str().unwrap());
    assert_eq!(room["status"], "playing");
    assert_eq!(room["current_turn"], "alice");

    let (status, body) = app
        .send(Method::POST, &moves_uri, Some("bob"), Some(cell(1, 1)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "turn");

    let (status, _) = app
        .send(Method::POST, &moves_uri, Some("alice"), Some(cell(0, 0)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::POST, &moves_uri, Some("bob"), Some(cell(0, 0)))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
    assert!(body["error"].as_str().unwrap().contains("cell is already occupied"));
    assert!(body.get("available_action").is_none());

    for (user, row, col) in [("bob", 1, 0), ("alice", 0, 1), ("bob", 1, 1)] {
        let (status, _) = app
            .send(Method::POST, &moves_uri, Some(user), Some(cell(row, col)))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app
        .send(Method::POST, &moves_uri, Some("alice"), Some(cell(0, 2)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["status"], "finished");
    assert_eq!(body["room"]["winner_id"], "alice");
    assert_eq!(body["outcome"]["winner"], "player1");

    let (status, body) = app
        .send(Method::POST, &moves_uri, Some("bob"), Some(cell(2, 2)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state_conflict");

    let (_, stats) = app.send(Method::GET, "/stats", Some("alice"), None).await;
    assert_eq!(stats[0]["wins"], 1);
    let (_, stats) = app.send(Method::GET, "/users/bob/stats", Some("alice"), None).await;
    assert_eq!(stats[0]["losses"], 1);
}

#[tokio::test]
async fn third_player_is_turned_away() {
    let app = TestApp::new().await;
    let room = app.started_room("connect4").await;

    let uri = format!("/rooms/{}/join", room["id"].as_str().unwrap());
    let (status, body) = app.send(Method::POST, &uri, Some("carol"), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "capacity");
}

#[tokio::test]
async fn creator_leaving_a_waiting_room_deletes_it() {
    let app = TestApp::new().await;
    let (_, room) = app
        .send(Method::POST, "/rooms", Some("alice"), Some(json!({ "game_type": "chess" })))
        .await;
    let room_uri = format!("/rooms/{}", room["id"].as_str().unwrap());

    let (status, _) = app
        .send(Method::POST, &format!("{}/leave", room_uri), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::GET, &room_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn lobby_lists_rooms_filtered_by_game() {
    let app = TestApp::new().await;
    app.started_room("checkers").await;
    app.send(Method::POST, "/rooms", Some("carol"), Some(json!({ "game_type": "domino" })))
        .await;

    let (status, body) = app
        .send(Method::GET, "/rooms?game_type=checkers", Some("alice"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let rooms = body.as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["game_type"], "checkers");
    assert_eq!(rooms[0]["player2_name"], "bob");
}

#[tokio::test]
async fn outsiders_cannot_finish_a_room() {
    let app = TestApp::new().await;
    let room = app.started_room("memory").await;
    let uri = format!("/rooms/{}/finish", room["id"].as_str().unwrap());

    let (status, _) = app
        .send(Method::POST, &uri, Some("mallory"), Some(json!({ "is_draw": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, &uri, Some("bob"), Some(json!({ "is_draw": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_draw"], true);
}
