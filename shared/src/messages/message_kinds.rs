use std::{collections::HashMap, marker::PhantomData};

use crate::{
    constants::COMPACT_MAX,
    messages::{
        error::MessageKindsError,
        message::{Message, MessageBuilder, MessageKind},
    },
    serde::{ByteReader, SerdeErr},
    types::NetId,
};

struct MessageFactory<M> {
    phantom: PhantomData<fn() -> M>,
}

impl<M: Message> MessageBuilder for MessageFactory<M> {
    fn name(&self) -> &'static str {
        std::any::type_name::<M>()
    }

    fn read(&self, reader: &mut ByteReader) -> Result<Box<dyn Message>, SerdeErr> {
        Ok(Box::new(M::read(reader)?))
    }
}

/// Registry mapping Message types to the small integer written on the wire.
///
/// Ids are handed out in registration order starting at 0, so both ends of a
/// connection must register the same types in the same order.
pub struct MessageKinds {
    current_net_id: NetId,
    kind_map: HashMap<MessageKind, (NetId, Box<dyn MessageBuilder>)>,
    net_id_map: HashMap<NetId, MessageKind>,
}

impl MessageKinds {
    pub fn new() -> Self {
        Self {
            current_net_id: 0,
            kind_map: HashMap::new(),
            net_id_map: HashMap::new(),
        }
    }

    /// Registers `M`, returning the id it will use on the wire
    pub fn try_add_message<M: Message>(&mut self) -> Result<NetId, MessageKindsError> {
        let message_kind = MessageKind::of::<M>();
        if self.kind_map.contains_key(&message_kind) {
            return Err(MessageKindsError::AlreadyRegistered {
                name: std::any::type_name::<M>(),
            });
        }
        if self.current_net_id > COMPACT_MAX {
            return Err(MessageKindsError::NetIdSpaceExhausted {
                limit: COMPACT_MAX,
            });
        }

        let net_id = self.current_net_id;
        self.kind_map.insert(
            message_kind,
            (
                net_id,
                Box::new(MessageFactory::<M> {
                    phantom: PhantomData,
                }),
            ),
        );
        self.net_id_map.insert(net_id, message_kind);
        self.current_net_id += 1;
        Ok(net_id)
    }

    /// Registers `M`
    ///
    /// # Panics
    /// Panics if `M` is already registered
    pub fn add_message<M: Message>(&mut self) -> NetId {
        self.try_add_message::<M>()
            .unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn net_id_of(&self, message_kind: &MessageKind) -> Result<NetId, MessageKindsError> {
        self.kind_map
            .get(message_kind)
            .map(|(net_id, _)| *net_id)
            .ok_or(MessageKindsError::MessageKindNotFound)
    }

    pub fn kind_of(&self, net_id: NetId) -> Result<MessageKind, MessageKindsError> {
        self.net_id_map
            .get(&net_id)
            .copied()
            .ok_or(MessageKindsError::NetIdNotFound { net_id })
    }

    pub fn is_registered(&self, message_kind: &MessageKind) -> bool {
        self.kind_map.contains_key(message_kind)
    }

    pub(crate) fn builder(&self, net_id: NetId) -> Option<&dyn MessageBuilder> {
        let message_kind = self.net_id_map.get(&net_id)?;
        self.kind_map
            .get(message_kind)
            .map(|(_, builder)| builder.as_ref())
    }

    pub fn len(&self) -> usize {
        self.kind_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind_map.is_empty()
    }
}

impl Default for MessageKinds {
    fn default() -> Self {
        Self::new()
    }
}
