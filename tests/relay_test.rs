//! End-to-end relay tests for the Babelon chat core
//!
//! These drive the full stack below the transport: session handlers,
//! translation dispatch with its cache and worker pool, the connection
//! registry and the in-memory persistence sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use babelon::common::{BabelonError, Result};
use babelon::core::traits::{AuthProvider, MessageSink, TranslationBackend};
use babelon::core::types::GroupId;
use babelon::core::Config;
use babelon::database::{MemoryMessageSink, MemoryPreferenceStore};
use babelon::service::Services;
use babelon::session::ChatSession;
use babelon_rooms::Connection;

/// Any token of the form "token-<user>" authenticates as <user>.
struct StubAuth;

#[async_trait]
impl AuthProvider for StubAuth {
    async fn verify(&self, token: &str) -> Result<String> {
        token
            .strip_prefix("token-")
            .map(str::to_string)
            .ok_or_else(|| BabelonError::Auth("unknown token".to_string()))
    }
}

/// Dictionary translator counting model invocations.
struct StubTranslator {
    calls: AtomicUsize,
}

impl StubTranslator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl TranslationBackend for StubTranslator {
    fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (text, target) {
            ("bonjour", "en") => Ok("hello".to_string()),
            ("bonjour", "es") => Ok("hola".to_string()),
            _ => Ok(format!("{target}:{text}")),
        }
    }
}

struct Harness {
    services: Arc<Services>,
    sink: Arc<MemoryMessageSink>,
    translator: Arc<StubTranslator>,
}

fn harness() -> Harness {
    let sink = Arc::new(MemoryMessageSink::new());
    let translator = Arc::new(StubTranslator::new());
    let services = Services::build(
        Config::default(),
        Arc::clone(&translator) as Arc<dyn TranslationBackend>,
        Arc::clone(&sink) as Arc<dyn MessageSink>,
        Arc::new(StubAuth),
        Arc::new(MemoryPreferenceStore::new()),
    );
    Harness {
        services,
        sink,
        translator,
    }
}

async fn connect(harness: &Harness, user: &str, group: GroupId) -> (ChatSession, Connection) {
    let mut session = ChatSession::new(Arc::clone(&harness.services));
    session
        .authenticate(&format!("token-{user}"))
        .await
        .expect("stub auth accepts token-<user>");
    let connection = session.join(group).await.expect("registry accepts joins");
    (session, connection)
}

async fn recv(connection: &mut Connection) -> String {
    tokio::time::timeout(Duration::from_secs(1), connection.recv())
        .await
        .expect("broadcast arrived in time")
        .expect("connection still registered")
}

async fn wait_for_sink(sink: &MemoryMessageSink, expected: usize) {
    for _ in 0..50 {
        if sink.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sink never reached {expected} message(s)");
}

#[test_log::test(tokio::test)]
async fn test_room_relay_scenario() {
    let harness = harness();
    let room = GroupId::room("r1");
    let (mut alice, mut alice_conn) = connect(&harness, "A", room.clone()).await;
    let (_bob, mut bob_conn) = connect(&harness, "B", room.clone()).await;

    let raw = r#"{"content":"bonjour","fromLanguage":"fr","toLanguages":["en"]}"#;
    alice.process_message(raw).await.unwrap();

    // Both members of r1 receive the translated copy, sender included.
    assert_eq!(recv(&mut bob_conn).await, "A (en): hello");
    assert_eq!(recv(&mut alice_conn).await, "A (en): hello");

    // The sink recorded exactly one original, untranslated entry.
    wait_for_sink(&harness.sink, 1).await;
    let history = harness.sink.history(&room).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, "A");
    assert_eq!(history[0].group, "r1");
    assert_eq!(history[0].content, "bonjour");
}

#[test_log::test(tokio::test)]
async fn test_private_chat_is_symmetric() {
    let harness = harness();

    // Each side names the other; both land in the same canonical group.
    let (mut alice, _alice_conn) =
        connect(&harness, "A", GroupId::private("A", "B")).await;
    let (_bob, mut bob_conn) = connect(&harness, "B", GroupId::private("B", "A")).await;

    let raw = r#"{"content":"bonjour","fromLanguage":"fr","toLanguages":["en"]}"#;
    alice.process_message(raw).await.unwrap();
    assert_eq!(recv(&mut bob_conn).await, "A (en): hello");

    wait_for_sink(&harness.sink, 1).await;
    let history = harness
        .sink
        .history(&GroupId::private("B", "A"))
        .await
        .unwrap();
    assert_eq!(history[0].group, "private:A:B");
}

#[test_log::test(tokio::test)]
async fn test_translation_cache_is_shared_across_sessions() {
    let harness = harness();
    let room = GroupId::room("r1");
    let (mut alice, _alice_conn) = connect(&harness, "A", room.clone()).await;
    let (mut bob, _bob_conn) = connect(&harness, "B", room.clone()).await;

    let raw = r#"{"content":"bonjour","fromLanguage":"fr","toLanguages":["en"]}"#;
    alice.process_message(raw).await.unwrap();
    bob.process_message(raw).await.unwrap();

    // Identical text/languages/register within the TTL: one model call.
    assert_eq!(harness.translator.calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test)]
async fn test_multi_language_fan_out() {
    let harness = harness();
    let room = GroupId::room("r1");
    let (mut alice, _alice_conn) = connect(&harness, "A", room.clone()).await;
    let (_bob, mut bob_conn) = connect(&harness, "B", room.clone()).await;

    let raw = r#"{"content":"bonjour","fromLanguage":"fr","toLanguages":["en","es","fr"]}"#;
    alice.process_message(raw).await.unwrap();

    let mut received = vec![
        recv(&mut bob_conn).await,
        recv(&mut bob_conn).await,
        recv(&mut bob_conn).await,
    ];
    received.sort();
    assert_eq!(
        received,
        vec![
            "A (en): hello".to_string(),
            "A (es): hola".to_string(),
            // Source-language target is passthrough, no model call.
            "A (fr): bonjour".to_string(),
        ]
    );
    assert_eq!(harness.translator.calls.load(Ordering::SeqCst), 2);

    // Still one persisted original for the three copies.
    wait_for_sink(&harness.sink, 1).await;
}

#[test_log::test(tokio::test)]
async fn test_departure_is_announced_to_remaining_members() {
    let harness = harness();
    let room = GroupId::room("r1");
    let (_alice, mut alice_conn) = connect(&harness, "A", room.clone()).await;
    let (mut bob, bob_conn) = connect(&harness, "B", room.clone()).await;

    bob.disconnect(&bob_conn).await;

    assert_eq!(recv(&mut alice_conn).await, "User B left");
    assert_eq!(harness.services.registry.member_count(&room).await, 1);
}

#[test_log::test(tokio::test)]
async fn test_shutdown_refuses_new_sessions() {
    let harness = harness();
    let (_alice, mut alice_conn) = connect(&harness, "A", GroupId::room("r1")).await;

    harness.services.shutdown().await;

    // Existing streams end, new joins are refused.
    assert_eq!(alice_conn.recv().await, None);
    let mut late = ChatSession::new(Arc::clone(&harness.services));
    late.authenticate("token-C").await.unwrap();
    assert!(matches!(
        late.join(GroupId::room("r1")).await,
        Err(BabelonError::RegistryClosed)
    ));
}
