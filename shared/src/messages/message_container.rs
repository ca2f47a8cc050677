use crate::{
    messages::message::{Message, MessageKind},
    types::{ChannelIndex, MessageIndex},
};

/// A Message together with the channel it travels on and the sequence the
/// queue stamped on it. Outbound containers always carry a sequence; inbound
/// ones only do when the channel is ordered, since unordered channels leave
/// the sequence off the wire.
pub struct MessageContainer {
    channel: ChannelIndex,
    seq: Option<MessageIndex>,
    message: Box<dyn Message>,
}

impl MessageContainer {
    pub fn new(channel: ChannelIndex, seq: Option<MessageIndex>, message: Box<dyn Message>) -> Self {
        Self {
            channel,
            seq,
            message,
        }
    }

    pub fn channel(&self) -> ChannelIndex {
        self.channel
    }

    pub fn seq(&self) -> Option<MessageIndex> {
        self.seq
    }

    pub fn name(&self) -> &'static str {
        self.message.name()
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    pub fn message(&self) -> &dyn Message {
        self.message.as_ref()
    }

    pub fn is<M: Message>(&self) -> bool {
        self.kind() == MessageKind::of::<M>()
    }

    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.message.as_ref().as_any().downcast_ref::<M>()
    }

    /// Takes the inner message out as `M`, or hands the container back if
    /// it holds another type
    pub fn downcast<M: Message>(self) -> Result<Box<M>, Self> {
        if !self.is::<M>() {
            return Err(self);
        }
        match self.message.into_any().downcast::<M>() {
            Ok(message) => Ok(message),
            Err(_) => unreachable!("message kind was checked before downcasting"),
        }
    }
}

impl std::fmt::Debug for MessageContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContainer")
            .field("channel", &self.channel)
            .field("seq", &self.seq)
            .field("message", &self.name())
            .finish()
    }
}
