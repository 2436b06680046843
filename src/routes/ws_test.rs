use super::*;
use crate::config::ServerConfig;

fn connected(state: &AppState, name: &str) -> (UserId, mpsc::Receiver<Frame>) {
    let viewer = Viewer::new(name);
    let id = viewer.id.clone();
    let (tx, rx) = mpsc::channel(16);
    state.directory.connect(viewer);
    state.transport.connect(id.clone(), tx);
    (id, rx)
}

#[tokio::test]
async fn blank_line_is_ignored() {
    let state = AppState::new(ServerConfig::default());
    let (mut user, _rx) = connected(&state, "Ash");
    assert!(process_inbound_text(&state, &mut user, "   ").await.is_none());
}

#[tokio::test]
async fn page_command_replies_through_transport_only() {
    let state = AppState::new(ServerConfig::default());
    let (mut user, mut rx) = connected(&state, "Ash");

    let reply = process_inbound_text(&state, &mut user, "/profile\n").await;

    assert!(reply.is_none());
    let pushed = rx.try_recv().unwrap();
    assert_eq!(pushed.kind, "page:deliver");
}

#[tokio::test]
async fn text_reply_becomes_reply_frame() {
    let state = AppState::new(ServerConfig::default());
    let (mut user, _rx) = connected(&state, "Ash");

    let frame = process_inbound_text(&state, &mut user, "/nick Gary").await.unwrap();

    assert_eq!(frame.kind, "command:reply");
    assert_eq!(frame.str_data(FRAME_MESSAGE), Some("You are now known as Gary."));
    assert_eq!(user.as_str(), "gary");
}

#[tokio::test]
async fn failure_becomes_error_frame() {
    let state = AppState::new(ServerConfig::default());
    let (mut user, _rx) = connected(&state, "Ash");

    let frame = process_inbound_text(&state, &mut user, "hello").await.unwrap();

    assert_eq!(frame.kind, "command:error");
    assert_eq!(frame.str_data(FRAME_CODE), Some("E_UNKNOWN_COMMAND"));
    assert_eq!(frame.str_data(FRAME_MESSAGE), Some("unknown command: hello"));
    assert_eq!(frame.data.get("retryable"), Some(&serde_json::json!(false)));
}

#[tokio::test]
async fn second_session_for_identity_is_refused() {
    let state = AppState::new(ServerConfig::default());
    let (first_tx, mut first_rx) = mpsc::channel(16);
    let (second_tx, _second_rx) = mpsc::channel(16);

    let mut user = open_session(&state, Viewer::new("Ash"), first_tx).unwrap();
    let err = open_session(&state, Viewer::new("ASH"), second_tx).unwrap_err();
    assert_eq!(err.error_code(), "E_NAME_TAKEN");

    // The live channel is still the first session's.
    process_inbound_text(&state, &mut user, "/profile").await;
    assert_eq!(first_rx.try_recv().unwrap().kind, "page:deliver");
}

#[tokio::test]
async fn closing_session_closes_pages_and_frees_identity() {
    let state = AppState::new(ServerConfig::default());
    let (tx, _rx) = mpsc::channel(16);
    let mut user = open_session(&state, Viewer::new("Ash"), tx).unwrap();
    process_inbound_text(&state, &mut user, "/profile").await;
    assert_eq!(state.profiles.lock().await.len(), 1);

    close_session(&state, &user).await;

    assert!(state.profiles.lock().await.is_empty());
    assert!(state.directory.resolve_viewer(&user).is_none());

    let (tx, mut rx) = mpsc::channel(16);
    let mut user = open_session(&state, Viewer::new("Ash"), tx).unwrap();
    let err = process_inbound_text(&state, &mut user, "/profile close").await.unwrap();
    assert_eq!(err.str_data(FRAME_CODE), Some("E_NO_PAGE"));

    process_inbound_text(&state, &mut user, "/profile").await;
    assert_eq!(rx.try_recv().unwrap().kind, "page:deliver");
}

#[tokio::test]
async fn many_short_sessions_leave_no_pages_behind() {
    let state = AppState::new(ServerConfig::default());
    for n in 0..20 {
        let (tx, _rx) = mpsc::channel(16);
        let mut user = open_session(&state, Viewer::new(format!("guest{n}")), tx).unwrap();
        process_inbound_text(&state, &mut user, "/profile").await;
        close_session(&state, &user).await;
    }
    assert!(state.profiles.lock().await.is_empty());
}

#[tokio::test]
async fn closing_session_after_nick_uses_new_identity() {
    let state = AppState::new(ServerConfig::default());
    let (tx, _rx) = mpsc::channel(16);
    let mut user = open_session(&state, Viewer::new("Ash"), tx).unwrap();
    process_inbound_text(&state, &mut user, "/profile").await;
    process_inbound_text(&state, &mut user, "/nick Gary").await;

    close_session(&state, &user).await;

    assert!(state.profiles.lock().await.is_empty());
    assert!(state.directory.resolve_viewer(&UserId::from_name("gary")).is_none());
}
