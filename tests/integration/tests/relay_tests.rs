//! Relay Integration Tests
//!
//! Each test starts its own in-process server on an ephemeral port; no external
//! services are required.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use std::time::Duration;

use integration_tests::{test_config, TestServer};
use relay_core::Envelope;
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.connection_count().await.unwrap(), 0);
}

// ============================================================================
// Publish Tests
// ============================================================================

#[tokio::test]
async fn test_navigate_echoes_envelope() {
    let server = TestServer::start().await.expect("Failed to start server");

    let echoed = server.navigate("dashboard").await.unwrap();

    assert_eq!(echoed, Envelope::navigation("dashboard"));
}

#[tokio::test]
async fn test_navigate_fans_out_to_every_client() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(3).await.unwrap();

    server.navigate("home").await.unwrap();

    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap(), Envelope::navigation("home"));
    }

    // Exactly one copy each
    for client in &mut clients {
        client.expect_silence(Duration::from_millis(100)).await.unwrap();
    }
}

#[tokio::test]
async fn test_failed_client_is_dropped_and_others_still_receive() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(3).await.unwrap();

    server.navigate("home").await.unwrap();
    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap().content(), "home");
    }

    // B goes away
    let b = clients.remove(1);
    b.close().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    server.navigate("about").await.unwrap();
    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap(), Envelope::navigation("about"));
    }
    assert_eq!(server.connection_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_envelopes_arrive_in_submission_order() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(2).await.unwrap();

    let routes = ["one", "two", "three", "four", "five"];
    for route in routes {
        server.navigate(route).await.unwrap();
    }

    for client in &mut clients {
        for route in routes {
            assert_eq!(client.next_envelope().await.unwrap().content(), route);
        }
    }
}

// ============================================================================
// Client Ingress Tests
// ============================================================================

#[tokio::test]
async fn test_client_message_is_relayed_to_all_clients() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(3).await.unwrap();

    let envelope = Envelope::new("hello", "chat");
    clients[0].send_envelope(&envelope).await.unwrap();

    // The sender is a registered connection too
    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap(), envelope);
    }
}

#[tokio::test]
async fn test_lenient_decoding_fills_missing_fields() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(2).await.unwrap();

    clients[0].send_text(r#"{"content":"partial"}"#).await.unwrap();
    assert_eq!(clients[1].next_envelope().await.unwrap(), Envelope::new("partial", ""));

    clients[0]
        .send_text(r#"{"content":"/legacy","type":"navigation"}"#)
        .await
        .unwrap();
    assert_eq!(clients[1].next_envelope().await.unwrap(), Envelope::navigation("/legacy"));
}

#[tokio::test]
async fn test_malformed_message_closes_only_that_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(2).await.unwrap();

    clients[0].send_text("this is not json").await.unwrap();

    assert_eq!(clients[0].next_close_code().await.unwrap(), Some(4002));
    server.wait_for_connections(1).await.unwrap();

    // Nothing from the bad client reached the other one
    server.navigate("after").await.unwrap();
    assert_eq!(clients[1].next_envelope().await.unwrap(), Envelope::navigation("after"));
}

#[tokio::test]
async fn test_binary_envelope_is_relayed_to_all_clients() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(3).await.unwrap();

    let envelope = Envelope::new("bytes", "chat");
    clients[0]
        .send_binary(envelope.encode().unwrap().into_bytes())
        .await
        .unwrap();

    // Fan-out is always text
    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap(), envelope);
    }
}

#[tokio::test]
async fn test_protocol_violation_drops_only_that_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = server.connect_many(2).await.unwrap();

    // Masked text frame with every reserved bit set
    clients[0]
        .send_raw(&[0xF1, 0x80, 0x00, 0x00, 0x00, 0x00])
        .await
        .unwrap();

    server.wait_for_connections(1).await.unwrap();

    server.navigate("after").await.unwrap();
    assert_eq!(clients[1].next_envelope().await.unwrap(), Envelope::navigation("after"));
}

#[tokio::test]
async fn test_client_that_stops_reading_does_not_stall_others() {
    let mut config = test_config();
    config.hub.connection_buffer = 1;
    config.hub.send_timeout_ms = Some(100);

    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");
    let mut clients = server.connect_many(3).await.unwrap();
    let idle = clients.pop().unwrap();

    for i in 0..20 {
        server.navigate(&format!("r{i}")).await.unwrap();
    }
    for client in &mut clients {
        for i in 0..20 {
            assert_eq!(client.next_envelope().await.unwrap().content(), format!("r{i}"));
        }
    }

    // The server may already have given up on it
    let _ = idle.close().await;
    server.wait_for_connections(2).await.unwrap();

    server.navigate("after").await.unwrap();
    for client in &mut clients {
        assert_eq!(client.next_envelope().await.unwrap(), Envelope::navigation("after"));
    }
}

#[tokio::test]
async fn test_disconnected_client_is_unregistered() {
    let server = TestServer::start().await.expect("Failed to start server");
    let clients = server.connect_many(2).await.unwrap();

    for client in clients {
        client.close().await.unwrap();
    }

    server.wait_for_connections(0).await.unwrap();

    // Publishing with nobody connected still succeeds
    assert_eq!(server.navigate("empty").await.unwrap(), Envelope::navigation("empty"));
}

#[tokio::test]
async fn test_late_client_only_sees_later_envelopes() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut early = server.connect_many(1).await.unwrap().remove(0);

    server.navigate("first").await.unwrap();
    assert_eq!(early.next_envelope().await.unwrap().content(), "first");

    let mut late = server.connect_many(1).await.unwrap().remove(0);
    server.navigate("second").await.unwrap();

    assert_eq!(early.next_envelope().await.unwrap().content(), "second");
    assert_eq!(late.next_envelope().await.unwrap().content(), "second");
}

#[tokio::test]
async fn test_small_buffers_still_deliver() {
    let mut config = test_config();
    config.hub.queue_capacity = 1;
    config.hub.connection_buffer = 1;

    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");
    let mut clients = server.connect_many(2).await.unwrap();

    for i in 0..10 {
        server.navigate(&format!("r{i}")).await.unwrap();
    }

    for client in &mut clients {
        for i in 0..10 {
            assert_eq!(client.next_envelope().await.unwrap().content(), format!("r{i}"));
        }
    }
}
