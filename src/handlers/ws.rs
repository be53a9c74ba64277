use actix_web::web::Bytes;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, ProtocolError};

use crate::board::OpinionBoard;

/// What to do with one item from the client's message stream.
#[derive(Debug, PartialEq)]
enum ClientAction {
    Pong(Bytes),
    Ignore,
    Stop,
}

/// Clients only ping and close; mutations go through the HTTP form posts.
/// A stream that ended or errored means the client is gone.
fn client_action(item: Option<Result<Message, ProtocolError>>) -> ClientAction {
    match item {
        Some(Ok(Message::Ping(bytes))) => ClientAction::Pong(bytes),
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => ClientAction::Stop,
        Some(Ok(_)) => ClientAction::Ignore,
    }
}

/// WebSocket upgrade handler. The socket receives the current snapshot right
/// away and another one after every board change.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    board: web::Data<OpinionBoard>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut rx = board.hub().register();
    let first = board.snapshot_message();
    let board = board.into_inner();

    actix_web::rt::spawn(async move {
        if ws_session.text(first).await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if ws_session.text(msg).await.is_err() {
                        break;
                    }
                }
                item = msg_stream.recv() => {
                    match client_action(item) {
                        ClientAction::Pong(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        ClientAction::Ignore => {}
                        ClientAction::Stop => break,
                    }
                }
            }
        }

        drop(rx);
        board.hub().prune();
        let _ = ws_session.close(None).await;
    });

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ended_or_broken_stream_stops_the_socket() {
        assert_eq!(client_action(None), ClientAction::Stop);
        assert_eq!(client_action(Some(Err(ProtocolError::Overflow))), ClientAction::Stop);
        assert_eq!(client_action(Some(Ok(Message::Close(None)))), ClientAction::Stop);
    }

    #[test]
    fn ping_is_answered_and_text_ignored() {
        assert_eq!(
            client_action(Some(Ok(Message::Ping(Bytes::from_static(b"hi"))))),
            ClientAction::Pong(Bytes::from_static(b"hi"))
        );
        assert_eq!(
            client_action(Some(Ok(Message::Text("hello".into())))),
            ClientAction::Ignore
        );
    }
}
