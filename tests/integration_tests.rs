use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use relayq::{ClientError, QueueStore, RelayClient, RelayConfig, RelayServer, RetryPolicy};

async fn start_server() -> (SocketAddr, Arc<QueueStore>) {
    let store = Arc::new(QueueStore::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = RelayServer::new(RelayConfig::default(), store.clone());
    tokio::spawn(server.serve(listener));

    (addr, store)
}

// Production defaults wait 8s between attempts; tests shrink the policy
fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        retry_delay: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(1),
        io_timeout: Duration::from_secs(1),
    }
}

fn test_client(addr: SocketAddr) -> RelayClient {
    RelayClient::with_policy(addr.ip().to_string(), addr.port(), test_policy())
}

/// An address nobody is listening on.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_publish_then_receive() {
    let (addr, _store) = start_server().await;
    let client = test_client(addr);

    assert!(client.publish("hello").await);
    assert_eq!(client.receive().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_delimiter_in_content_round_trips() {
    let (addr, _store) = start_server().await;
    let client = test_client(addr);

    assert!(client.publish("a|b|c").await);
    assert_eq!(client.receive().await.unwrap(), "a|b|c");
}

#[tokio::test]
async fn test_receive_on_empty_queue_is_a_protocol_error() {
    let (addr, _store) = start_server().await;
    let client = test_client(addr);

    let start = Instant::now();
    let result = client.receive().await;

    match result {
        Err(ClientError::Server(raw)) => {
            assert_eq!(raw, "ERROR|No hay mensajes disponibles");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    // Protocol errors are not retried, so no retry delay was spent
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn test_fifo_order_across_calls() {
    let (addr, _store) = start_server().await;
    let client = test_client(addr);

    for i in 0..5 {
        assert!(client.publish(&format!("message-{}", i)).await);
    }
    for i in 0..5 {
        assert_eq!(client.receive().await.unwrap(), format!("message-{}", i));
    }
}

#[tokio::test]
async fn test_queue_is_shared_across_clients() {
    let (addr, _store) = start_server().await;
    let producer = test_client(addr);
    let consumer = test_client(addr);

    assert_ne!(producer.app_id(), consumer.app_id());
    assert!(producer.publish("shared").await);
    assert_eq!(consumer.receive().await.unwrap(), "shared");
}

#[tokio::test]
async fn test_concurrent_publishes_and_receives_deliver_exactly_once() {
    let (addr, store) = start_server().await;

    let mut publishers = vec![];
    for i in 0..10 {
        publishers.push(tokio::spawn(async move {
            let client = test_client(addr);
            client.publish(&format!("message-{}", i)).await
        }));
    }
    for publisher in publishers {
        assert!(publisher.await.unwrap());
    }
    assert_eq!(store.len(), 10);

    let mut receivers = vec![];
    for _ in 0..10 {
        receivers.push(tokio::spawn(async move {
            let client = test_client(addr);
            client.receive().await.unwrap()
        }));
    }

    let mut received = HashSet::new();
    for receiver in receivers {
        received.insert(receiver.await.unwrap());
    }

    let expected: HashSet<String> = (0..10).map(|i| format!("message-{}", i)).collect();
    assert_eq!(received, expected);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_command_gets_error_response() {
    let (addr, _store) = start_server().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"SUBSCRIBE|some-client").await.unwrap();

    let mut buffer = vec![0u8; 1024];
    let n = socket.read(&mut buffer).await.unwrap();

    assert_eq!(
        String::from_utf8_lossy(&buffer[..n]),
        "ERROR|Comando no válido"
    );
}

#[tokio::test]
async fn test_malformed_publish_gets_error_response() {
    let (addr, store) = start_server().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"PUBLISH|missing-content").await.unwrap();

    let mut buffer = vec![0u8; 1024];
    let n = socket.read(&mut buffer).await.unwrap();

    assert_eq!(
        String::from_utf8_lossy(&buffer[..n]),
        "ERROR|Comando no válido"
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_bad_request_does_not_break_later_connections() {
    let (addr, _store) = start_server().await;

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(b"\xff\xfe garbage").await.unwrap();
    let mut buffer = vec![0u8; 1024];
    let _ = socket.read(&mut buffer).await.unwrap();
    drop(socket);

    // Server keeps serving
    let client = test_client(addr);
    assert!(client.publish("still alive").await);
    assert_eq!(client.receive().await.unwrap(), "still alive");
}

#[tokio::test]
async fn test_unreachable_server_exhausts_retries() {
    let addr = dead_addr().await;
    let policy = test_policy();
    let client = RelayClient::with_policy(addr.ip().to_string(), addr.port(), policy.clone());

    let start = Instant::now();
    assert!(!client.publish("lost").await);

    // Both attempts ran with one fixed delay in between
    assert!(start.elapsed() >= policy.retry_delay);

    match client.receive().await {
        Err(ClientError::Exhausted { attempts }) => assert_eq!(attempts, 2),
        other => panic!("expected connectivity exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_calls_leave_queue_untouched() {
    let (addr, store) = start_server().await;
    let client = test_client(addr);
    assert!(client.publish("kept").await);

    let dead = dead_addr().await;
    let broken = RelayClient::with_policy(dead.ip().to_string(), dead.port(), test_policy());
    assert!(broken.receive().await.is_err());
    assert!(!broken.publish("dropped").await);

    // No ghost dequeue, no partial enqueue
    assert_eq!(store.len(), 1);
    assert_eq!(client.receive().await.unwrap(), "kept");
}

#[tokio::test]
async fn test_bounded_connections_still_serve_everyone() {
    let store = Arc::new(QueueStore::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = RelayConfig {
        max_connections: Some(2),
        ..RelayConfig::default()
    };
    let server = RelayServer::new(config, store);
    tokio::spawn(server.serve(listener));

    let client = test_client(addr);
    for i in 0..5 {
        assert!(client.publish(&format!("message-{}", i)).await);
    }
    for i in 0..5 {
        assert_eq!(client.receive().await.unwrap(), format!("message-{}", i));
    }
}
