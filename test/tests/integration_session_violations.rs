//! Misbehaving peers lose their connection, everyone else carries on

use std::time::Instant;

use tidewire_session::{
    ControlMessage, NetworkSession, PeerId, SessionConfig, SessionHeader, SessionMessageType,
    SessionType, SharedData,
};
use tidewire_shared::{ByteWriter, Connection};
use tidewire_test::{LocalNetwork, LocalNetworkService, TestSharedData, TestSharedDataFactory};

const ADDRESS: &str = "10.0.0.1";
const PORT: u16 = 9000;

type Session = NetworkSession<LocalNetworkService>;

fn state_of(name: &str, score: i32) -> Vec<u8> {
    let mut data = TestSharedData::new(name);
    data.set_score(score);
    let mut writer = ByteWriter::new();
    SharedData::serialize(&data, &mut writer);
    writer.to_bytes()
}

fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

fn peer(value: u8) -> PeerId {
    PeerId::new(value).unwrap()
}

// Host with two settled clients, peers 1 and 2
fn session_of_three() -> (Session, Session, Session, Instant) {
    let network = LocalNetwork::new();
    let now = Instant::now();
    let mut host = NetworkSession::new(
        network.bind(ADDRESS, PORT),
        TestSharedDataFactory,
        SessionConfig::default(),
    );
    host.host().unwrap();

    let mut alice = NetworkSession::new(network.client(), TestSharedDataFactory, SessionConfig::default());
    let mut bob = NetworkSession::new(network.client(), TestSharedDataFactory, SessionConfig::default());
    alice.join(ADDRESS, PORT).unwrap();
    bob.join(ADDRESS, PORT).unwrap();
    for _ in 0..3 {
        host.update(&now);
        alice.update(&now);
        bob.update(&now);
    }
    assert_eq!(alice.my_peer_id(), Some(peer(1)));
    assert_eq!(bob.my_peer_id(), Some(peer(2)));

    (host, alice, bob, now)
}

// Queues `packet` at the host as if `from` had sent it
fn inject_at_host(host: &Session, from: PeerId, packet: Vec<u8>) {
    host.connection(from).unwrap().inject(packet);
}

#[test]
fn spoofed_source_is_not_relayed() {
    init_logger();
    let (mut host, mut alice, mut bob, now) = session_of_three();

    let spoofed = SessionHeader::new(SessionMessageType::ToPeers, 2).packet(b"it was bob");
    inject_at_host(&host, peer(1), spoofed);
    host.update(&now);

    assert!(host.receive().is_none());
    assert!(bob.receive().is_none());
    assert!(host.connection(peer(1)).unwrap().status().is_closed());
    assert!(host.connection(peer(2)).unwrap().status().is_open());

    host.update(&now);
    alice.update(&now);
    assert_eq!(host.peer_ids(), vec![peer(2)]);
    assert_eq!(alice.session_type(), SessionType::Undefined);
    assert_eq!(bob.session_type(), SessionType::Client);
}

#[test]
fn peers_cannot_assign_ids() {
    init_logger();
    let (mut host, _alice, _bob, now) = session_of_three();

    inject_at_host(&host, peer(1), ControlMessage::SetPeerId {
            peer_id: 5,
            base_version: 0,
        }
        .packet(1));
    host.update(&now);

    assert!(host.connection(peer(1)).unwrap().status().is_closed());
    assert!(host.connection(peer(2)).unwrap().status().is_open());
}

#[test]
fn peers_cannot_set_session_state() {
    init_logger();
    let (mut host, _alice, _bob, now) = session_of_three();

    let forged = ControlMessage::SetSessionState {
        version: 1,
        state: vec![0, 0, 0, 0, 0, 0],
    };
    inject_at_host(&host, peer(2), forged.packet(2));
    host.update(&now);

    assert!(host.connection(peer(2)).unwrap().status().is_closed());
    let session_data = host
        .session_shared_data()
        .and_then(|data| data.downcast_ref::<TestSharedData>())
        .unwrap();
    assert_eq!(session_data.name(), "lobby");
}

#[test]
fn peers_cannot_set_foreign_state() {
    init_logger();
    let (mut host, _alice, mut bob, now) = session_of_three();

    let forged = ControlMessage::SetPeerState {
        peer_id: 2,
        version: 1,
        state: state_of("impostor", 0),
    };
    inject_at_host(&host, peer(1), forged.packet(1));
    host.update(&now);
    bob.update(&now);

    assert!(host.connection(peer(1)).unwrap().status().is_closed());
    assert!(host.client_shared_data(peer(2)).is_none());
    assert_eq!(
        bob.my_shared_data()
            .and_then(|data| data.downcast_ref::<TestSharedData>())
            .map(TestSharedData::name),
        Some("peer-2")
    );
}

#[test]
fn malformed_header_closes_the_connection() {
    init_logger();
    let (mut host, _alice, _bob, now) = session_of_three();

    inject_at_host(&host, peer(2), vec![7]);
    host.update(&now);

    assert!(host.connection(peer(2)).unwrap().status().is_closed());
    assert!(host.connection(peer(1)).unwrap().status().is_open());
}

#[test]
fn clients_only_accept_ids_from_the_host() {
    init_logger();
    let (_host, mut alice, _bob, now) = session_of_three();

    let forged = ControlMessage::SetPeerId {
        peer_id: 9,
        base_version: 0,
    }
    .packet(2);
    alice.connection(PeerId::HOST).unwrap().inject(forged);
    alice.update(&now);

    assert_eq!(alice.session_type(), SessionType::Undefined);
    assert!(alice.my_peer_id().is_none());
}

#[test]
fn clients_reject_to_master_packets() {
    init_logger();
    let (_host, mut alice, _bob, now) = session_of_three();

    let stray = SessionHeader::new(SessionMessageType::ToMaster, 0).packet(b"?");
    alice.connection(PeerId::HOST).unwrap().inject(stray);

    assert!(alice.receive().is_none());
    alice.update(&now);
    assert_eq!(alice.session_type(), SessionType::Undefined);
}

#[test]
fn peer_state_is_relayed_byte_for_byte() {
    init_logger();
    let (mut host, mut alice, mut bob, now) = session_of_three();

    let packet = ControlMessage::SetPeerState {
        peer_id: 1,
        version: 1,
        state: state_of("alice", 3),
    }
    .packet(1);
    inject_at_host(&host, peer(1), packet.clone());
    host.update(&now);

    let at_bob = bob.connection_mut(PeerId::HOST).unwrap().receive();
    assert_eq!(at_bob, Some(packet));
    assert!(bob.connection_mut(PeerId::HOST).unwrap().receive().is_none());
    assert!(alice.connection_mut(PeerId::HOST).unwrap().receive().is_none());
}

#[test]
fn stale_peer_state_is_dropped_at_the_host() {
    init_logger();
    let (mut host, _alice, mut bob, now) = session_of_three();

    let newer = ControlMessage::SetPeerState {
        peer_id: 1,
        version: 2,
        state: state_of("alice", 2),
    };
    let older = ControlMessage::SetPeerState {
        peer_id: 1,
        version: 1,
        state: state_of("alice", 1),
    };
    inject_at_host(&host, peer(1), newer.packet(1));
    inject_at_host(&host, peer(1), older.packet(1));
    host.update(&now);
    bob.update(&now);
    host.update(&now);
    bob.update(&now);

    let at_host = host
        .client_shared_data(peer(1))
        .and_then(|data| data.downcast_ref::<TestSharedData>())
        .unwrap();
    assert_eq!(at_host.score(), 2);
    assert!(host.connection(peer(1)).unwrap().status().is_open());
    let at_bob = bob
        .client_shared_data(peer(1))
        .and_then(|data| data.downcast_ref::<TestSharedData>())
        .unwrap();
    assert_eq!(at_bob.score(), 2);
}

#[test]
fn stale_session_state_is_dropped_at_clients() {
    init_logger();
    let (_host, mut alice, _bob, now) = session_of_three();

    let newer = ControlMessage::SetSessionState {
        version: 7,
        state: state_of("final", 7),
    };
    let older = ControlMessage::SetSessionState {
        version: 6,
        state: state_of("draft", 6),
    };
    alice.connection(PeerId::HOST).unwrap().inject(newer.packet(0));
    alice.connection(PeerId::HOST).unwrap().inject(older.packet(0));
    alice.update(&now);

    let session_data = alice
        .session_shared_data()
        .and_then(|data| data.downcast_ref::<TestSharedData>())
        .unwrap();
    assert_eq!(session_data.name(), "final");
    assert_eq!(alice.session_type(), SessionType::Client);
}
