//! Socket session tests over a real listener.

use super::*;
use crate::domain::ports::{MockAuthService, RealtimePublisher};
use crate::domain::{Error, RealtimeGatewayImpl, Role, RoomName, UserId, events};
use crate::inbound::ws;
use crate::inbound::ws::origin::OriginPolicy;
use crate::inbound::ws::state::WsState;
use crate::outbound::realtime::RoomHub;
use crate::test_support::{actor, sample_user};
use actix_web::{App, HttpServer, dev::ServerHandle, http::header};
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use futures_util::{SinkExt, StreamExt};
use rstest::rstest;
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

const TOKEN: &str = "socket-token";

struct Harness {
    url: String,
    hub: Arc<RoomHub>,
    user: AuthenticatedUser,
    _server: ServerHandle,
}

fn start(role: Role) -> Harness {
    let user = actor(&sample_user(role, "Sam Socket"));
    let signed_in = user.clone();
    let mut auth = MockAuthService::new();
    auth.expect_authenticate().returning(move |token| {
        if token.expose() == TOKEN {
            Ok(signed_in.clone())
        } else {
            Err(Error::unauthorized("invalid or expired token"))
        }
    });
    let hub = Arc::new(RoomHub::default());
    let gateway = Arc::new(RealtimeGatewayImpl::new(hub.clone()));
    let origins = OriginPolicy::new(["http://localhost:5173"]).expect("valid origin");
    let state = WsState::new(Arc::new(auth), gateway, origins);

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .workers(1)
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Harness {
        url: format!("http://{addr}/ws"),
        hub,
        user,
        _server: handle,
    }
}

async fn connect(harness: &Harness) -> Socket {
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{}?token={TOKEN}", harness.url))
        .set_header(header::ORIGIN, "http://localhost:5173")
        .connect()
        .await
        .expect("websocket connect");
    socket
}

/// Next frame that is not part of the heartbeat exchange.
async fn next_frame(socket: &mut Socket) -> Frame {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => return other,
        }
    }
}

async fn next_json(socket: &mut Socket) -> Value {
    match next_frame(socket).await {
        Frame::Text(bytes) => serde_json::from_slice(&bytes).expect("json frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn send(socket: &mut Socket, value: Value) {
    socket
        .send(awc::ws::Message::Text(value.to_string().into()))
        .await
        .expect("send text");
}

#[rstest]
#[actix_rt::test]
async fn join_chat_acknowledges_the_canonical_room() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;
    let other = UserId::random();

    send(&mut socket, json!({ "event": "join-chat", "data": { "otherUserId": other } })).await;

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["event"], "joined");
    assert_eq!(
        frame["data"]["room"],
        RoomName::chat(harness.user.id, other).to_string()
    );
}

#[rstest]
#[actix_rt::test]
async fn pushes_events_for_the_personal_room() {
    let harness = start(Role::Teacher);
    let mut socket = connect(&harness).await;

    harness.hub.emit_to_user(
        &harness.user.id,
        RealtimeEvent::new(events::BOOKING_CREATED, &json!({ "id": "b-1" })),
    );

    let frame = next_json(&mut socket).await;
    assert_eq!(frame, json!({ "event": "booking-created", "data": { "id": "b-1" } }));
}

#[rstest]
#[actix_rt::test]
async fn role_mismatch_yields_error_frame() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;

    send(&mut socket, json!({ "event": "join-teacher-bookings" })).await;

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["event"], "error");
    assert_eq!(frame["data"]["code"], "forbidden");
}

#[rstest]
#[actix_rt::test]
async fn unknown_event_yields_error_frame_and_keeps_socket_open() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;

    send(&mut socket, json!({ "event": "dance" })).await;
    let frame = next_json(&mut socket).await;
    assert_eq!(frame["data"]["code"], "invalid_request");

    send(&mut socket, json!({ "event": "join-student-bookings" })).await;
    let frame = next_json(&mut socket).await;
    assert_eq!(frame["event"], "joined");
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;

    socket
        .send(awc::ws::Message::Text("not-json".into()))
        .await
        .expect("send text");

    match next_frame(&mut socket).await {
        Frame::Close(reason) => {
            assert_eq!(reason.expect("reason").code, CloseCode::Policy);
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed = tokio::time::timeout(Duration::from_secs(2), next_frame(&mut socket))
        .await
        .expect("close frame within timeout");

    match observed {
        Frame::Close(reason) => {
            let reason = reason.expect("close reason");
            assert_eq!(reason.code, CloseCode::Normal);
            assert_eq!(reason.description.as_deref(), Some("heartbeat timeout"));
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn disconnect_removes_memberships() {
    let harness = start(Role::Student);
    let mut socket = connect(&harness).await;
    assert_eq!(harness.hub.connection_count(), 1);

    socket
        .send(awc::ws::Message::Close(None))
        .await
        .expect("send close");
    let _ = tokio::time::timeout(Duration::from_secs(1), socket.next()).await;
    tokio::time::sleep(HEARTBEAT_INTERVAL).await;

    assert_eq!(harness.hub.connection_count(), 0);
    assert_eq!(harness.hub.room_size(&RoomName::User(harness.user.id)), 0);
}

#[rstest]
#[case(None, Some("http://localhost:5173"), 401)]
#[case(Some("wrong"), Some("http://localhost:5173"), 401)]
#[case(Some(TOKEN), Some("https://evil.example"), 403)]
#[actix_rt::test]
async fn rejects_bad_handshakes(
    #[case] token: Option<&str>,
    #[case] origin: Option<&str>,
    #[case] expected: u16,
) {
    let harness = start(Role::Student);
    let url = match token {
        Some(token) => format!("{}?token={token}", harness.url),
        None => harness.url.clone(),
    };
    let mut request = awc::Client::default().ws(url);
    if let Some(origin) = origin {
        request = request.set_header(header::ORIGIN, origin);
    }

    match request.connect().await {
        Err(awc::error::WsClientError::InvalidResponseStatus(status)) => {
            assert_eq!(status.as_u16(), expected);
        }
        Err(other) => panic!("unexpected handshake error: {other}"),
        Ok(_) => panic!("handshake should have been rejected"),
    }
    assert_eq!(harness.hub.connection_count(), 0);
}
