/// Payloads moved through the encoded wire form and an in-memory transport

use replica_server::ServerError;
use replica_shared::{encode_message, SubscriberKey, TransportError};
use replica_test::{
    global, health, position, registry, target, LocalTransport, TestClient, TestServer,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_payloads_reach_the_mirror_over_the_wire() {
    init_logger();
    let mut server = TestServer::new(registry(vec![]));
    let kinds = server.kinds;
    let mut transport = LocalTransport::new();
    let mut client = TestClient::new(1);
    let mut receiver = transport.receiver(client.key);
    server.connect(1);

    let prey = server.spawn(vec![(kinds.position, position(1, 1))]);
    let hunter = server.spawn(vec![(kinds.target, target(&prey)), (kinds.health, health(3))]);
    let sent = server
        .server
        .send_all_payloads_to(&mut transport)
        .expect("delivered");
    assert_eq!(sent, 1);
    assert_eq!(transport.pending(&client.key), 1);

    let applied = client
        .client
        .receive_all(&mut client.world, &mut receiver)
        .expect("transport open");

    assert_eq!(applied, 3);
    let local_prey = client.local(&global(&prey)).expect("prey mirrored");
    assert_eq!(
        client.value(&global(&hunter), &kinds.target),
        Some(&target(&local_prey))
    );
    assert_eq!(client.value(&global(&prey), &kinds.position), Some(&position(1, 1)));

    server.insert(&prey, kinds.position, position(2, 1));
    server
        .server
        .send_all_payloads_to(&mut transport)
        .expect("delivered");
    client
        .client
        .receive_all(&mut client.world, &mut receiver)
        .expect("transport open");
    assert_eq!(client.value(&global(&prey), &kinds.position), Some(&position(2, 1)));
}

#[test]
fn test_unreachable_subscriber_does_not_block_others() {
    init_logger();
    let mut server = TestServer::new(registry(vec![]));
    let kinds = server.kinds;
    let mut transport = LocalTransport::new();
    let mut client = TestClient::new(1);
    let mut receiver = transport.receiver(client.key);
    server.connect(1);
    server.connect(2);
    let entity = server.spawn(vec![(kinds.position, position(1, 1))]);

    let result = server.server.send_all_payloads_to(&mut transport);

    assert_eq!(
        result,
        Err(ServerError::Transport {
            subscriber: SubscriberKey::new(2),
            source: TransportError::Unreachable { subscriber: 2 },
        })
    );
    client
        .client
        .receive_all(&mut client.world, &mut receiver)
        .expect("transport open");
    assert_eq!(client.value(&global(&entity), &kinds.position), Some(&position(1, 1)));
}

#[test]
fn test_malformed_payload_is_skipped() {
    init_logger();
    let mut server = TestServer::new(registry(vec![]));
    let kinds = server.kinds;
    let mut transport = LocalTransport::new();
    let mut client = TestClient::new(1);
    let mut receiver = transport.receiver(client.key);
    server.connect(1);
    let entity = server.spawn(vec![(kinds.position, position(1, 1))]);

    receiver.inject(vec![0x9f, 0x01]);
    server
        .server
        .send_all_payloads_to(&mut transport)
        .expect("delivered");

    let applied = client
        .client
        .receive_all(&mut client.world, &mut receiver)
        .expect("transport open");

    assert_eq!(applied, 1);
    assert_eq!(client.value(&global(&entity), &kinds.position), Some(&position(1, 1)));
}

#[test]
fn test_sync_events_match_wire_payloads() {
    init_logger();
    let mut server = TestServer::new(registry(vec![]));
    let kinds = server.kinds;
    let subscriber = server.connect(4);
    server.spawn(vec![(kinds.health, health(2))]);

    let produced = server.server.send_all_payloads().expect("batched");
    let mut events = server.server.take_sync_events();

    assert_eq!(produced, 1);
    assert_eq!(events.len(), 1);
    let event = events.read().next().expect("one event");
    assert_eq!(event.subscriber, subscriber);
    assert_eq!(event.tick, 0);
    assert!(encode_message(&event.message).is_ok());
    assert_eq!(server.server.current_tick(), 1);
}
