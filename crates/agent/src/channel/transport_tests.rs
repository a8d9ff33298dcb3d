// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the WebSocket transport against a loopback server.

#![allow(clippy::unwrap_used)]

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use super::transport::{Transport, TransportError, WebSocketTransport};

/// Accepts one client, sends `frames`, then closes.
async fn serve(frames: Vec<Message>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(None).await;
    });
    format!("ws://{addr}/ws/status")
}

#[tokio::test]
async fn receives_text_frames_then_close() {
    let url = serve(vec![
        Message::Ping(Default::default()),
        Message::Text(r#"{"cpu": 3}"#.into()),
        Message::Binary(b"{\"cpu\": 4}".to_vec().into()),
    ])
    .await;

    let mut transport = WebSocketTransport::new();
    assert!(!transport.is_connected());
    transport.connect(&url).await.unwrap();
    assert!(transport.is_connected());

    assert_eq!(transport.recv().await.unwrap().as_deref(), Some(r#"{"cpu": 3}"#));
    assert_eq!(transport.recv().await.unwrap().as_deref(), Some(r#"{"cpu": 4}"#));
    assert_eq!(transport.recv().await.unwrap(), None);
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut transport = WebSocketTransport::new();
    let err = transport.connect(&format!("ws://{addr}/ws/status")).await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionFailed(_)));
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn recv_without_connection_reports_closed() {
    let mut transport = WebSocketTransport::new();
    assert_eq!(transport.recv().await, Err(TransportError::ConnectionClosed));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let url = serve(Vec::new()).await;
    let mut transport = WebSocketTransport::new();
    transport.connect(&url).await.unwrap();

    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
    transport.disconnect().await.unwrap();
}
