use std::{
    collections::{HashMap, VecDeque},
    time::Instant,
};

use log::{debug, info, warn};

use tidewire_shared::{
    sequence_newer, ByteReader, Connection, ConnectionStatus, NetworkService, ReliableConnection,
};

use crate::{
    control::ControlMessage,
    control_outbox::ControlSlot,
    error::{ProtocolViolation, SessionError},
    header::{SessionHeader, SessionMessageType},
    peer::Peer,
    peer_id::PeerId,
    session_config::{SessionConfig, HOST_COUNTS_AS_CLIENT},
    shared_data::{SharedData, SharedDataFactory},
};

/// Role of the local participant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionType {
    Undefined,
    Host,
    Client,
}

/// Application packet popped from `NetworkSession::receive`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundSessionPacket {
    pub src_peer_id: PeerId,
    pub message_type: SessionMessageType,
    pub payload: Vec<u8>,
}

/// Star topology session over a NetworkService.
///
/// The host accepts connections, hands out peer ids, relays `ToPeers`
/// traffic between clients and replicates shared data. Clients hold a single
/// connection to the host. Everything runs inside `update` and `receive`,
/// which the application calls every tick.
pub struct NetworkSession<S: NetworkService> {
    service: S,
    config: SessionConfig,
    factory: Box<dyn SharedDataFactory>,
    session_type: SessionType,
    my_peer_id: Option<PeerId>,
    peers: Vec<Peer<S::Connection>>,
    session_data: Option<Box<dyn SharedData>>,
    my_data: Option<Box<dyn SharedData>>,
    peer_data: HashMap<PeerId, Box<dyn SharedData>>,
    // version of the last blob applied or published, per target
    session_version: Option<u16>,
    my_version: u16,
    peer_versions: HashMap<PeerId, u16>,
    inbox: VecDeque<InboundSessionPacket>,
}

impl<S: NetworkService> NetworkSession<S> {
    pub fn new<F: SharedDataFactory + 'static>(
        service: S,
        factory: F,
        mut config: SessionConfig,
    ) -> Self {
        let max_clients = PeerId::MAX.value() as usize + HOST_COUNTS_AS_CLIENT;
        if config.max_clients > max_clients {
            warn!(
                "max_clients {} exceeds the peer id space, clamping to {}",
                config.max_clients, max_clients
            );
            config.max_clients = max_clients;
        }

        Self {
            service,
            config,
            factory: Box::new(factory),
            session_type: SessionType::Undefined,
            my_peer_id: None,
            peers: Vec::new(),
            session_data: None,
            my_data: None,
            peer_data: HashMap::new(),
            session_version: None,
            my_version: 0,
            peer_versions: HashMap::new(),
            inbox: VecDeque::new(),
        }
    }

    // Lifecycle

    /// Starts hosting: takes peer id 0, creates the session-wide and own
    /// shared data and starts accepting connections
    pub fn host(&mut self) -> Result<(), SessionError> {
        self.check_inactive()?;

        self.session_type = SessionType::Host;
        self.my_peer_id = Some(PeerId::HOST);
        self.session_data = Some(self.factory.make_session_data());
        self.my_data = Some(self.factory.make_peer_data(PeerId::HOST));
        self.session_version = Some(0);
        self.my_version = 0;
        self.service.set_accepting_connections(true);

        info!("hosting session for up to {} clients", self.config.max_clients);
        Ok(())
    }

    /// Connects to a host. The session stays `Connecting` until the host
    /// assigns a peer id.
    pub fn join(&mut self, address: &str, port: u16) -> Result<(), SessionError> {
        self.check_inactive()?;

        let connection = self.service.connect(address, port)?;
        self.session_type = SessionType::Client;
        self.session_data = Some(self.factory.make_session_data());
        self.peers.push(Peer::new(connection, PeerId::HOST));

        info!("joining session at {}:{}", address, port);
        Ok(())
    }

    /// Closes every connection and drops all session state
    pub fn close(&mut self) {
        if self.session_type == SessionType::Undefined {
            return;
        }
        if self.session_type == SessionType::Host {
            self.service.set_accepting_connections(false);
        }
        for peer in self.peers.iter_mut() {
            peer.connection.close();
        }

        info!("closing {:?} session", self.session_type);
        self.peers.clear();
        self.session_type = SessionType::Undefined;
        self.my_peer_id = None;
        self.session_data = None;
        self.my_data = None;
        self.peer_data.clear();
        self.session_version = None;
        self.my_version = 0;
        self.peer_versions.clear();
        self.inbox.clear();
    }

    /// Runs one session tick
    pub fn update(&mut self, now: &Instant) {
        match self.session_type {
            SessionType::Undefined => {}
            SessionType::Host => self.update_host(now),
            SessionType::Client => self.update_client(now),
        }
    }

    fn update_host(&mut self, now: &Instant) {
        self.reap_closed_peers();
        self.accept_connection();
        self.process_incoming();
        self.push_modified_data();
        self.flush_controls(now);
    }

    fn update_client(&mut self, now: &Instant) {
        self.process_incoming();

        let host_lost = self
            .peers
            .first()
            .map_or(true, |peer| peer.connection.status().is_closed());
        if host_lost {
            info!("connection to host lost");
            self.close();
            return;
        }

        self.push_modified_data();
        self.flush_controls(now);
    }

    fn reap_closed_peers(&mut self) {
        let mut reaped = Vec::new();
        self.peers.retain(|peer| {
            let closed = peer.connection.status().is_closed();
            if closed {
                reaped.push(peer.peer_id);
            }
            !closed
        });
        // versions outlive the peer, so whoever reuses the id continues
        // past the last blob everyone has seen
        for peer_id in reaped {
            info!("peer {} disconnected", peer_id);
            self.peer_data.remove(&peer_id);
        }
    }

    fn accept_connection(&mut self) {
        if self.client_count() >= self.config.max_clients {
            self.service.set_accepting_connections(false);
            return;
        }
        self.service.set_accepting_connections(true);

        let Some(connection) = self.service.try_accept_connection() else {
            return;
        };
        let Some(peer_id) = self.free_peer_id() else {
            warn!("no free peer id, refusing connection");
            let mut connection = connection;
            connection.close();
            return;
        };

        info!("peer {} connected", peer_id);
        let mut peer = Peer::new(connection, peer_id);
        self.bootstrap(&mut peer);
        self.peers.push(peer);

        if self.client_count() >= self.config.max_clients {
            self.service.set_accepting_connections(false);
        }
    }

    // Smallest id not held by a connected peer
    fn free_peer_id(&self) -> Option<PeerId> {
        (1..=PeerId::MAX.value())
            .filter_map(PeerId::new)
            .find(|candidate| self.peers.iter().all(|peer| peer.peer_id != *candidate))
    }

    // Tells a newcomer its id and everything replicated so far
    fn bootstrap(&self, peer: &mut Peer<S::Connection>) {
        let host = PeerId::HOST.to_wire();
        peer.outbox.push(
            ControlSlot::PeerId,
            ControlMessage::SetPeerId {
                peer_id: peer.peer_id.to_wire(),
                base_version: self.peer_version(peer.peer_id),
            }
            .packet(host),
        );
        if let Some(session_data) = &self.session_data {
            peer.outbox.push(
                ControlSlot::SessionState,
                ControlMessage::SetSessionState {
                    version: self.session_version.unwrap_or(0),
                    state: session_data.to_bytes(),
                }
                .packet(host),
            );
        }
        if let Some(my_data) = &self.my_data {
            peer.outbox.push(
                ControlSlot::PeerState(PeerId::HOST),
                ControlMessage::SetPeerState {
                    peer_id: host,
                    version: self.my_version,
                    state: my_data.to_bytes(),
                }
                .packet(host),
            );
        }

        let mut known: Vec<_> = self.peer_data.keys().copied().collect();
        known.sort();
        for peer_id in known {
            if peer_id == peer.peer_id {
                continue;
            }
            if let Some(data) = self.peer_data.get(&peer_id) {
                peer.outbox.push(
                    ControlSlot::PeerState(peer_id),
                    ControlMessage::SetPeerState {
                        peer_id: peer_id.to_wire(),
                        version: self.peer_version(peer_id),
                        state: data.to_bytes(),
                    }
                    .packet(host),
                );
            }
        }
    }

    // Queues modified shared data for every connection and clears the flags
    fn push_modified_data(&mut self) {
        let Some(my_peer_id) = self.my_peer_id else {
            return;
        };
        let src = my_peer_id.to_wire();

        if self.session_type == SessionType::Host {
            if let Some(session_data) = self.session_data.as_mut().filter(|data| data.is_modified()) {
                let version = self.session_version.unwrap_or(0).wrapping_add(1);
                self.session_version = Some(version);
                let packet = ControlMessage::SetSessionState {
                    version,
                    state: session_data.to_bytes(),
                }
                .packet(src);
                session_data.mark_unmodified();
                for peer in self.peers.iter_mut() {
                    peer.outbox.push(ControlSlot::SessionState, packet.clone());
                }
            }
        }

        if let Some(my_data) = self.my_data.as_mut().filter(|data| data.is_modified()) {
            self.my_version = self.my_version.wrapping_add(1);
            let packet = ControlMessage::SetPeerState {
                peer_id: src,
                version: self.my_version,
                state: my_data.to_bytes(),
            }
            .packet(src);
            my_data.mark_unmodified();
            for peer in self.peers.iter_mut() {
                peer.outbox.push(ControlSlot::PeerState(my_peer_id), packet.clone());
            }
        }
    }

    fn flush_controls(&mut self, now: &Instant) {
        let resend = self.config.control_resend;
        for peer in self.peers.iter_mut() {
            if peer.connection.status().is_closed() {
                peer.outbox.clear();
                continue;
            }
            peer.outbox.flush(&mut peer.connection, now, &resend);
        }
    }

    // Incoming

    fn process_incoming(&mut self) {
        for index in 0..self.peers.len() {
            self.process_peer(index);
        }
    }

    fn process_peer(&mut self, index: usize) {
        let peer = &mut self.peers[index];
        for tag in peer.connection.drain_acks() {
            peer.outbox.on_acked(tag);
        }
        if !peer.connection.status().is_open() {
            return;
        }

        while let Some(packet) = self.peers[index].connection.receive() {
            if let Err(violation) = self.handle_packet(index, packet) {
                let peer = &mut self.peers[index];
                warn!(
                    "protocol violation from peer {}, closing connection: {}",
                    peer.peer_id, violation
                );
                peer.connection.close();
                peer.outbox.clear();
                return;
            }
        }
    }

    fn handle_packet(&mut self, index: usize, packet: Vec<u8>) -> Result<(), ProtocolViolation> {
        let mut reader = ByteReader::new(&packet);
        let header = SessionHeader::read(&mut reader)?;

        match self.session_type {
            SessionType::Host => {
                let sender = self.peers[index].peer_id;
                if header.src_peer_id != sender.to_wire() {
                    return Err(ProtocolViolation::SpoofedSource {
                        claimed: header.src_peer_id,
                        actual: sender,
                    });
                }
                match header.message_type {
                    SessionMessageType::ToPeers => {
                        for (other, peer) in self.peers.iter_mut().enumerate() {
                            if other != index {
                                peer.connection.send(packet.clone());
                            }
                        }
                        self.push_inbox(sender, header.message_type, reader.read_remaining());
                        Ok(())
                    }
                    SessionMessageType::ToMaster => {
                        self.push_inbox(sender, header.message_type, reader.read_remaining());
                        Ok(())
                    }
                    SessionMessageType::Control => {
                        let control = ControlMessage::read(&mut reader)?;
                        self.handle_control_at_host(index, sender, control, &packet)
                    }
                }
            }
            SessionType::Client => {
                let src = PeerId::from_wire(header.src_peer_id).ok_or(
                    ProtocolViolation::InvalidSource {
                        src: header.src_peer_id,
                    },
                )?;
                match header.message_type {
                    SessionMessageType::ToPeers => {
                        self.push_inbox(src, header.message_type, reader.read_remaining());
                        Ok(())
                    }
                    SessionMessageType::ToMaster => Err(ProtocolViolation::UnexpectedToMaster),
                    SessionMessageType::Control => {
                        let control = ControlMessage::read(&mut reader)?;
                        self.handle_control_at_client(src, control)
                    }
                }
            }
            SessionType::Undefined => Ok(()),
        }
    }

    fn handle_control_at_host(
        &mut self,
        index: usize,
        sender: PeerId,
        control: ControlMessage,
        packet: &[u8],
    ) -> Result<(), ProtocolViolation> {
        match control {
            ControlMessage::SetPeerId { .. } | ControlMessage::SetSessionState { .. } => {
                Err(ProtocolViolation::HostOnlyControl {
                    control: control.name(),
                    src: sender.to_wire(),
                })
            }
            ControlMessage::SetPeerState {
                peer_id,
                version,
                state,
            } => {
                if peer_id != sender.to_wire() {
                    return Err(ProtocolViolation::ForeignPeerState {
                        src: sender.to_wire(),
                        peer_id,
                    });
                }
                if !self.apply_peer_state(sender, version, &state)? {
                    return Ok(());
                }

                // gossip to everyone else, byte for byte
                for (other, peer) in self.peers.iter_mut().enumerate() {
                    if other != index {
                        peer.outbox.push(ControlSlot::PeerState(sender), packet.to_vec());
                    }
                }
                Ok(())
            }
        }
    }

    fn handle_control_at_client(
        &mut self,
        src: PeerId,
        control: ControlMessage,
    ) -> Result<(), ProtocolViolation> {
        match control {
            ControlMessage::SetPeerId {
                peer_id,
                base_version,
            } => {
                if !src.is_host() {
                    return Err(ProtocolViolation::HostOnlyControl {
                        control: control.name(),
                        src: src.to_wire(),
                    });
                }
                let assigned = PeerId::from_wire(peer_id)
                    .filter(|assigned| !assigned.is_host())
                    .ok_or(ProtocolViolation::InvalidPeerId { peer_id })?;
                if self.my_peer_id != Some(assigned) {
                    info!("assigned peer id {}", assigned);
                    self.my_peer_id = Some(assigned);
                    self.my_version = base_version;
                    self.my_data = Some(self.factory.make_peer_data(assigned));
                }
                Ok(())
            }
            ControlMessage::SetSessionState { version, state } => {
                if !src.is_host() {
                    return Err(ProtocolViolation::HostOnlyControl {
                        control: "SetSessionState",
                        src: src.to_wire(),
                    });
                }
                if !is_newer(self.session_version, version) {
                    debug!("ignoring stale session state version {}", version);
                    return Ok(());
                }
                let session_data = self
                    .session_data
                    .get_or_insert_with(|| self.factory.make_session_data());
                session_data
                    .deserialize(&mut ByteReader::new(&state))
                    .map_err(|_| ProtocolViolation::MalformedState {
                        target: "session".to_string(),
                    })?;
                session_data.mark_unmodified();
                self.session_version = Some(version);
                Ok(())
            }
            ControlMessage::SetPeerState {
                peer_id,
                version,
                state,
            } => {
                if !src.is_host() && peer_id != src.to_wire() {
                    return Err(ProtocolViolation::ForeignPeerState {
                        src: src.to_wire(),
                        peer_id,
                    });
                }
                let target =
                    PeerId::from_wire(peer_id).ok_or(ProtocolViolation::InvalidPeerId { peer_id })?;
                if Some(target) == self.my_peer_id {
                    return Ok(());
                }
                self.apply_peer_state(target, version, &state)?;
                Ok(())
            }
        }
    }

    // Returns whether the blob was newer than the last one applied for
    // `peer_id`. Stale blobs are dropped without error.
    fn apply_peer_state(
        &mut self,
        peer_id: PeerId,
        version: u16,
        state: &[u8],
    ) -> Result<bool, ProtocolViolation> {
        if !is_newer(self.peer_versions.get(&peer_id).copied(), version) {
            debug!("ignoring stale state version {} for peer {}", version, peer_id);
            return Ok(false);
        }
        let factory = &self.factory;
        let data = self
            .peer_data
            .entry(peer_id)
            .or_insert_with(|| factory.make_peer_data(peer_id));
        data.deserialize(&mut ByteReader::new(state))
            .map_err(|_| ProtocolViolation::MalformedState {
                target: format!("peer {}", peer_id),
            })?;
        data.mark_unmodified();
        self.peer_versions.insert(peer_id, version);
        Ok(true)
    }

    fn push_inbox(&mut self, src_peer_id: PeerId, message_type: SessionMessageType, payload: &[u8]) {
        self.inbox.push_back(InboundSessionPacket {
            src_peer_id,
            message_type,
            payload: payload.to_vec(),
        });
    }

    // Application traffic

    /// Sends `payload` to every other participant. Clients send it to the
    /// host, which relays it.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        self.send_to_all(payload, None)
    }

    /// Sends a `ToPeers` packet on every connection except the one to
    /// `except`
    pub fn send_to_all(&mut self, payload: &[u8], except: Option<PeerId>) -> Result<(), SessionError> {
        let src = self.assigned_peer_id()?;
        let packet = SessionHeader::new(SessionMessageType::ToPeers, src.to_wire()).packet(payload);
        for peer in self.peers.iter_mut() {
            if Some(peer.peer_id) != except {
                peer.connection.send(packet.clone());
            }
        }
        Ok(())
    }

    /// Sends `payload` to the host only. On the host it lands in its own
    /// inbox.
    pub fn send_to_master(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let src = self.assigned_peer_id()?;
        if self.session_type == SessionType::Host {
            self.push_inbox(src, SessionMessageType::ToMaster, payload);
            return Ok(());
        }
        let packet = SessionHeader::new(SessionMessageType::ToMaster, src.to_wire()).packet(payload);
        for peer in self.peers.iter_mut() {
            peer.connection.send(packet.clone());
        }
        Ok(())
    }

    /// Reads every available packet, then returns the oldest application
    /// packet
    pub fn receive(&mut self) -> Option<InboundSessionPacket> {
        self.process_incoming();
        self.inbox.pop_front()
    }

    // Accessors

    pub fn status(&self) -> ConnectionStatus {
        match self.session_type {
            SessionType::Undefined => ConnectionStatus::Undefined,
            SessionType::Host => ConnectionStatus::Open,
            SessionType::Client => {
                if self.my_peer_id.is_some() {
                    ConnectionStatus::Open
                } else {
                    ConnectionStatus::Connecting
                }
            }
        }
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    /// Participants known to this session, the local one included
    pub fn client_count(&self) -> usize {
        match self.session_type {
            SessionType::Undefined => 0,
            SessionType::Host => self.peers.len() + HOST_COUNTS_AS_CLIENT,
            SessionType::Client => self.peer_data.len() + 1,
        }
    }

    pub fn my_peer_id(&self) -> Option<PeerId> {
        self.my_peer_id
    }

    /// Ids of the connected peers (host) or of the host (client)
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|peer| peer.peer_id).collect()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Connection to `peer_id`, if connected
    pub fn connection(&self, peer_id: PeerId) -> Option<&S::Connection> {
        self.peers
            .iter()
            .find(|peer| peer.peer_id == peer_id)
            .map(|peer| &peer.connection)
    }

    pub fn connection_mut(&mut self, peer_id: PeerId) -> Option<&mut S::Connection> {
        self.peers
            .iter_mut()
            .find(|peer| peer.peer_id == peer_id)
            .map(|peer| &mut peer.connection)
    }

    /// Control packets to `peer_id` still waiting for an ack
    pub fn pending_controls(&self, peer_id: PeerId) -> usize {
        self.peers
            .iter()
            .find(|peer| peer.peer_id == peer_id)
            .map_or(0, |peer| peer.outbox.len())
    }

    pub fn my_shared_data(&self) -> Option<&dyn SharedData> {
        self.my_data.as_deref()
    }

    pub fn my_shared_data_mut(&mut self) -> Option<&mut dyn SharedData> {
        match &mut self.my_data {
            Some(data) => Some(data.as_mut()),
            None => None,
        }
    }

    pub fn session_shared_data(&self) -> Option<&dyn SharedData> {
        self.session_data.as_deref()
    }

    /// Session-wide data, writable on the host only
    pub fn session_shared_data_mut(&mut self) -> Result<&mut dyn SharedData, SessionError> {
        match self.session_type {
            SessionType::Undefined => Err(SessionError::NotActive),
            SessionType::Client => Err(SessionError::NotHost),
            SessionType::Host => match &mut self.session_data {
                Some(data) => Ok(data.as_mut()),
                None => Err(SessionError::NotActive),
            },
        }
    }

    /// Shared data of `peer_id` as last replicated, or our own
    pub fn client_shared_data(&self, peer_id: PeerId) -> Option<&dyn SharedData> {
        if Some(peer_id) == self.my_peer_id {
            return self.my_shared_data();
        }
        self.peer_data.get(&peer_id).map(|data| &**data)
    }

    fn peer_version(&self, peer_id: PeerId) -> u16 {
        self.peer_versions.get(&peer_id).copied().unwrap_or(0)
    }

    fn assigned_peer_id(&self) -> Result<PeerId, SessionError> {
        if self.session_type == SessionType::Undefined {
            return Err(SessionError::NotActive);
        }
        self.my_peer_id.ok_or(SessionError::PeerIdUnassigned)
    }

    fn check_inactive(&self) -> Result<(), SessionError> {
        if self.session_type != SessionType::Undefined {
            return Err(SessionError::AlreadyActive {
                session_type: self.session_type,
            });
        }
        Ok(())
    }
}

fn is_newer(last_applied: Option<u16>, version: u16) -> bool {
    last_applied.map_or(true, |last| sequence_newer(version, last))
}
