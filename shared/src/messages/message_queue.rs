use std::{collections::HashMap, time::Instant};

use log::{debug, trace, warn};

use crate::{
    constants::MAX_CHANNELS,
    messages::{
        channels::{channel::ChannelSettings, channel_state::Channel},
        error::{FrameError, MessageQueueError},
        frame::{deframe_packet, encode_frame},
        message::Message,
        message_container::MessageContainer,
        message_kinds::MessageKinds,
        message_queue_config::MessageQueueConfig,
        packet_builder::{OutboundMessage, PacketBuilder},
        pending_packet::PendingPacket,
    },
    transport::{ReliableConnection, ReliableSubPacket},
    types::{ChannelIndex, MessageIndex, NetId, PacketTag},
};

/// Multiplexes up to 32 channels of typed messages over one connection.
///
/// Messages are queued with `enqueue`, packed and handed to the transport by
/// `send_all`, and come back out of `receive_all` once their channel's
/// ordering contract allows. Unacknowledged reliable packets are resent by
/// `send_all` when their timeout expires.
pub struct MessageQueue<C: ReliableConnection> {
    connection: C,
    config: MessageQueueConfig,
    message_kinds: MessageKinds,
    channels: [Channel; MAX_CHANNELS],
    outbound: Vec<OutboundMessage>,
    pending_packets: HashMap<PacketTag, PendingPacket>,
    next_packet_tag: PacketTag,
}

impl<C: ReliableConnection> MessageQueue<C> {
    pub fn new(connection: C, config: MessageQueueConfig) -> Self {
        Self::with_kinds(connection, config, MessageKinds::new())
    }

    /// Creates a queue sharing an already populated message registry
    pub fn with_kinds(connection: C, config: MessageQueueConfig, message_kinds: MessageKinds) -> Self {
        Self {
            connection,
            config,
            message_kinds,
            channels: std::array::from_fn(|_| Channel::new()),
            outbound: Vec::new(),
            pending_packets: HashMap::new(),
            next_packet_tag: PacketTag::new(0),
        }
    }

    // Setup

    /// Configures one channel slot (fallible version)
    pub fn try_set_channel(
        &mut self,
        channel: usize,
        settings: ChannelSettings,
    ) -> Result<(), MessageQueueError> {
        let index = Self::channel_index(channel)?;
        let slot = &mut self.channels[channel];
        if slot.is_initialized() {
            return Err(MessageQueueError::ChannelAlreadyConfigured { channel: index });
        }
        slot.configure(settings);
        Ok(())
    }

    /// Configures one channel slot
    ///
    /// # Panics
    /// Panics if the index is out of range or the channel is already configured
    pub fn set_channel(&mut self, channel: usize, settings: ChannelSettings) {
        self.try_set_channel(channel, settings)
            .unwrap_or_else(|err| panic!("{}", err))
    }

    /// Registers a Message type (fallible version). Both ends must register
    /// the same types in the same order.
    pub fn try_add_message<M: Message>(&mut self) -> Result<NetId, MessageQueueError> {
        Ok(self.message_kinds.try_add_message::<M>()?)
    }

    /// Registers a Message type
    ///
    /// # Panics
    /// Panics if the type is already registered
    pub fn add_message<M: Message>(&mut self) -> NetId {
        self.message_kinds.add_message::<M>()
    }

    // Outgoing

    /// Queues `message` on `channel` until the next `send_all` (fallible
    /// version). Returns the sequence stamped on the message.
    pub fn try_enqueue<M: Message>(
        &mut self,
        message: M,
        channel: usize,
    ) -> Result<MessageIndex, MessageQueueError> {
        self.try_enqueue_boxed(Box::new(message), channel)
    }

    /// Queues `message` on `channel` until the next `send_all`
    ///
    /// # Panics
    /// Panics if the channel is invalid or unconfigured, the type is not
    /// registered, or the message can never fit in a packet
    pub fn enqueue<M: Message>(&mut self, message: M, channel: usize) -> MessageIndex {
        self.try_enqueue(message, channel)
            .unwrap_or_else(|err| panic!("{}", err))
    }

    /// Same as `try_enqueue`, for messages that are already boxed
    pub fn try_enqueue_boxed(
        &mut self,
        message: Box<dyn Message>,
        channel: usize,
    ) -> Result<MessageIndex, MessageQueueError> {
        let index = Self::channel_index(channel)?;
        let slot = &mut self.channels[channel];
        let settings = *slot
            .settings()
            .ok_or(MessageQueueError::ChannelNotConfigured { channel: index })?;

        // the sequence is only consumed once the message is accepted, so a
        // rejected message never opens a gap on an ordered channel
        let seq = slot.last_sent_seq().wrapping_add(1);
        let container = MessageContainer::new(index, Some(seq), message);
        let frame = encode_frame(
            &container,
            settings.ordered,
            &self.message_kinds,
            self.config.max_packet_size,
        )?;
        slot.next_send_seq();

        trace!("enqueued `{}` on channel {} seq {}", container.name(), index, seq);
        self.outbound.push(OutboundMessage {
            message: container,
            frame,
            reliable: settings.reliable,
        });
        Ok(seq)
    }

    /// Resends expired reliable packets, then packs every queued message and
    /// hands the packets to the connection (fallible version).
    ///
    /// A message that cannot fit in an empty packet is dropped and reported;
    /// all other packets of this call are still sent.
    pub fn try_send_all(&mut self, now: &Instant) -> Result<(), MessageQueueError> {
        let mut sub_packets = Vec::new();
        let mut sent = Vec::new();

        self.collect_resends(now, &mut sub_packets, &mut sent);

        let builder = PacketBuilder::new(self.config.max_packet_size);
        let mut first_error = None;
        loop {
            match builder.build_packet(&mut self.outbound) {
                Ok(Some(packet)) => {
                    let tag = self.next_packet_tag.take_next();
                    sub_packets.push(ReliableSubPacket::new(tag, packet.payload.clone()));
                    sent.push((
                        tag,
                        PendingPacket {
                            messages: packet.messages,
                            payload: packet.payload,
                            reliable: packet.reliable,
                            time_sent: *now,
                        },
                    ));
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("dropping unsendable message: {}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        if !sub_packets.is_empty() {
            trace!("sending {} packets", sub_packets.len());
            self.connection.send_tagged(sub_packets);
        }
        self.pending_packets.extend(sent);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resends expired reliable packets, then packs every queued message and
    /// hands the packets to the connection
    ///
    /// # Panics
    /// Panics if a queued message cannot fit in a packet
    pub fn send_all(&mut self, now: &Instant) {
        self.try_send_all(now)
            .unwrap_or_else(|err| panic!("{}", err))
    }

    // Expired reliable packets are resent under a new tag. Every expired
    // packet leaves the pending table, unreliable ones for good.
    fn collect_resends(
        &mut self,
        now: &Instant,
        sub_packets: &mut Vec<ReliableSubPacket>,
        sent: &mut Vec<(PacketTag, PendingPacket)>,
    ) {
        let latency = self.connection.latency();
        let resend = &self.config.resend;
        let mut expired: Vec<PacketTag> = self
            .pending_packets
            .iter()
            .filter(|(_, packet)| resend.is_expired(&packet.time_sent, now, latency))
            .map(|(tag, _)| *tag)
            .collect();
        expired.sort();

        for tag in expired {
            let Some(mut packet) = self.pending_packets.remove(&tag) else {
                continue;
            };
            if !packet.reliable {
                trace!("forgetting unreliable packet {}", tag);
                continue;
            }
            let new_tag = self.next_packet_tag.take_next();
            debug!("resending packet {} as {} ({} bytes)", tag, new_tag, packet.size());
            packet.time_sent = *now;
            sub_packets.push(ReliableSubPacket::new(new_tag, packet.payload.clone()));
            sent.push((new_tag, packet));
        }
    }

    // Incoming

    /// Deframes every packet available on an open connection, applies
    /// received acks and returns the messages released by each channel, in
    /// channel order (fallible version).
    ///
    /// A malformed packet closes the connection. Nothing from that packet is
    /// kept, and messages released by earlier packets stay buffered until the
    /// next call.
    pub fn try_receive_all(&mut self) -> Result<Vec<MessageContainer>, FrameError> {
        let result = self.read_packets();
        self.apply_acks();
        result?;
        Ok(self.collect_ready_messages())
    }

    /// Deframes every packet available on an open connection, applies
    /// received acks and returns the messages released by each channel, in
    /// channel order
    pub fn receive_all(&mut self) -> Vec<MessageContainer> {
        match self.try_receive_all() {
            Ok(messages) => messages,
            Err(_) => self.collect_ready_messages(),
        }
    }

    fn read_packets(&mut self) -> Result<(), FrameError> {
        if !self.connection.status().is_open() {
            return Ok(());
        }
        while let Some(packet) = self.connection.receive() {
            let messages = match deframe_packet(&packet, &self.channels, &self.message_kinds) {
                Ok(messages) => messages,
                Err(err) => {
                    warn!("closing connection after malformed packet: {}", err);
                    self.connection.close();
                    return Err(err);
                }
            };
            for message in messages {
                let channel = &mut self.channels[message.channel() as usize];
                if channel.accepts(message.seq()) {
                    channel.push_received(message);
                } else {
                    trace!(
                        "dropping duplicate seq {:?} on channel {}",
                        message.seq(),
                        message.channel()
                    );
                }
            }
        }
        Ok(())
    }

    fn apply_acks(&mut self) {
        for tag in self.connection.drain_acks() {
            self.on_packet_acked(tag);
        }
    }

    fn collect_ready_messages(&mut self) -> Vec<MessageContainer> {
        let mut output = Vec::new();
        for channel in self.channels.iter_mut() {
            channel.ready_messages(&mut output);
        }
        output
    }

    /// Marks the packet sent under `tag` as delivered. Unknown or already
    /// acknowledged tags are ignored.
    pub fn on_packet_acked(&mut self, tag: PacketTag) {
        let Some(packet) = self.pending_packets.remove(&tag) else {
            return;
        };
        trace!("packet {} acknowledged", tag);
        for message in packet.messages {
            self.channels[message.channel() as usize].on_message_acked(message);
        }
    }

    // Accessors

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn config(&self) -> &MessageQueueConfig {
        &self.config
    }

    pub fn message_kinds(&self) -> &MessageKinds {
        &self.message_kinds
    }

    pub fn channel(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    /// Messages enqueued but not yet packed
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Packets sent and neither acknowledged nor expired
    pub fn pending_packet_count(&self) -> usize {
        self.pending_packets.len()
    }

    fn channel_index(channel: usize) -> Result<ChannelIndex, MessageQueueError> {
        if channel >= MAX_CHANNELS {
            return Err(MessageQueueError::InvalidChannel {
                channel,
                max: MAX_CHANNELS - 1,
            });
        }
        Ok(channel as ChannelIndex)
    }
}
