//! Full-stack tests: a real relay on a loopback socket, driven by the
//! client transport and messenger facade.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use obscura_client::{ConversationStore, Direction, Keystore, Messenger, RelayTransport};
use obscura_crypto::IdentityKeyPair;
use obscura_protocol::Sender;
use obscura_relay::{router, RelayState};

/// Spawn a relay on an ephemeral port, returning its base URL.
async fn spawn_relay() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::new(RelayState::with_defaults()));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn messenger(base_url: &str, dir: &TempDir) -> Messenger {
    let keystore = Keystore::new(dir.path().join("keys"));
    let identity = keystore.load_or_generate().unwrap();
    Messenger::new(
        identity,
        RelayTransport::new(base_url),
        ConversationStore::new(dir.path().join("chat_data")),
    )
}

#[tokio::test]
async fn send_and_receive_between_two_clients() {
    let base_url = spawn_relay().await;

    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let alice = messenger(&base_url, &alice_dir);
    let bob = messenger(&base_url, &bob_dir);

    let message_id = alice
        .send_text(&bob.public_key(), "hello bob", 3_600)
        .await
        .unwrap();
    assert_eq!(message_id.len(), 32);

    let received = bob.fetch_messages().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].sender, Sender::Known(alice.public_key()));
    assert_eq!(received[0].text, "hello bob");

    // Consumed: a second fetch finds nothing.
    assert!(bob.fetch_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn messages_land_in_the_right_conversations() {
    let base_url = spawn_relay().await;

    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let carol_dir = TempDir::new().unwrap();
    let alice = messenger(&base_url, &alice_dir);
    let bob = messenger(&base_url, &bob_dir);
    let carol = messenger(&base_url, &carol_dir);

    alice
        .send_text(&carol.public_key(), "from alice", 3_600)
        .await
        .unwrap();
    bob.send_text(&carol.public_key(), "from bob", 3_600)
        .await
        .unwrap();

    let received = carol.fetch_messages().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].text, "from alice");
    assert_eq!(received[1].text, "from bob");

    // Dispatched by the inner sender key, not anything the relay saw.
    let from_alice = carol.history(&alice.public_key()).unwrap();
    assert_eq!(from_alice.len(), 1);
    assert_eq!(from_alice[0].direction, Direction::Inbound);
    assert_eq!(from_alice[0].text, "from alice");

    let from_bob = carol.history(&bob.public_key()).unwrap();
    assert_eq!(from_bob.len(), 1);
    assert_eq!(from_bob[0].text, "from bob");
}

#[tokio::test]
async fn third_party_sees_nothing() {
    let base_url = spawn_relay().await;

    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let eve_dir = TempDir::new().unwrap();
    let alice = messenger(&base_url, &alice_dir);
    let bob = messenger(&base_url, &bob_dir);
    let eve = messenger(&base_url, &eve_dir);

    alice
        .send_text(&bob.public_key(), "for bob only", 3_600)
        .await
        .unwrap();

    // Eve polls her own token: different key, different queue.
    assert!(eve.fetch_messages().await.unwrap().is_empty());

    // Bob still gets it.
    let received = bob.fetch_messages().await.unwrap();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn outbound_history_recorded() {
    let base_url = spawn_relay().await;

    let alice_dir = TempDir::new().unwrap();
    let bob_dir = TempDir::new().unwrap();
    let alice = messenger(&base_url, &alice_dir);
    let bob = messenger(&base_url, &bob_dir);

    alice
        .send_text(&bob.public_key(), "first", 3_600)
        .await
        .unwrap();
    alice
        .send_text(&bob.public_key(), "second", 3_600)
        .await
        .unwrap();

    let history = alice.history(&bob.public_key()).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.direction == Direction::Outbound));
    assert_eq!(history[0].text, "first");
    assert_eq!(history[1].text, "second");
}

#[tokio::test]
async fn transport_poll_and_status() {
    let base_url = spawn_relay().await;
    let transport = RelayTransport::new(&base_url);

    let status = transport.status().await.unwrap();
    assert_eq!(status.active_tokens, 0);
    assert_eq!(status.total_messages, 0);

    // A never-seen token answers with the empty shape, same as any other.
    let identity = IdentityKeyPair::generate();
    let token = obscura_protocol::RoutingToken::derive(&identity.public_key());
    let response = transport.poll(&token, None).await.unwrap();
    assert_eq!(response.count, 0);
    assert!(response.messages.is_empty());
}
