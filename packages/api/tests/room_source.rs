//! `HttpRoomSource` against the real router served on a local port.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use api::state::AppState;
use shared::config::Config;
use shared::models::game_type::GameType;
use shared::services::auth_service::AuthServiceTrait;
use shared::sync::{HttpRoomSource, RoomSource, SyncError};

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn api() -> (AppState, String) {
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret".to_string()),
        "RNG_SEED" => Some("42".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::from_config(&config).await;
    let addr = serve(api::app(state.clone())).await;
    (state, format!("http://{}", addr))
}

#[tokio::test]
async fn fetches_an_existing_room() {
    let (state, base_url) = api().await;
    let room = state.room_service.create(GameType::Connect4, "alice").await.unwrap();
    let token = state.auth_service.generate_token("alice").unwrap().token;

    let fetched = HttpRoomSource::new(&base_url, &token)
        .fetch_room(&room.id)
        .await
        .unwrap();

    assert_eq!(fetched, Some(room));
}

#[tokio::test]
async fn unknown_room_is_none() {
    let (state, base_url) = api().await;
    let token = state.auth_service.generate_token("alice").unwrap().token;

    let fetched = HttpRoomSource::new(&base_url, &token)
        .fetch_room("no-such-room")
        .await
        .unwrap();

    assert_eq!(fetched, None);
}

#[tokio::test]
async fn rejected_token_is_an_http_error() {
    let (state, base_url) = api().await;
    let room = state.room_service.create(GameType::Connect4, "alice").await.unwrap();

    let result = HttpRoomSource::new(&base_url, "not-a-jwt").fetch_room(&room.id).await;

    match result {
        Err(SyncError::Http(msg)) => assert!(msg.contains("401"), "{}", msg),
        other => panic!("expected an HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn body_that_is_not_a_room_is_a_decode_error() {
    let router = Router::new().route("/rooms/{id}", get(|| async { "Healthy!" }));
    let base_url = format!("http://{}", serve(router).await);

    let result = HttpRoomSource::new(&base_url, "any").fetch_room("abc").await;

    assert!(matches!(result, Err(SyncError::Decode(_))), "{:?}", result);
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = HttpRoomSource::new(&format!("http://{}", addr), "any")
        .fetch_room("abc")
        .await;

    assert!(matches!(result, Err(SyncError::Http(_))), "{:?}", result);
}
