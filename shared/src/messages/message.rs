use std::any::{Any, TypeId};

use crate::serde::{ByteReader, ByteWriter, SerdeErr};

/// Access to the concrete type behind a trait object
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// A typed payload that can travel over a MessageQueue channel.
///
/// Implementors only describe their own bytes; the channel id, sequence,
/// length and type id framing is added by the queue.
pub trait Message: AsAny + Send + Sync + 'static {
    /// Serialize the payload
    fn write(&self, writer: &mut ByteWriter);

    /// Build the message back from its payload. The reader holds exactly the
    /// bytes produced by `write`.
    fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr>
    where
        Self: Sized;

    /// Size of the payload in bytes. The default serializes into a scratch
    /// buffer; override it when the size is cheap to compute.
    fn serialized_size(&self) -> usize {
        let mut writer = ByteWriter::new();
        self.write(&mut writer);
        writer.len()
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn kind(&self) -> MessageKind {
        MessageKind {
            type_id: TypeId::of::<Self>(),
        }
    }
}

/// Runtime identity of a registered Message type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageKind {
    type_id: TypeId,
}

impl MessageKind {
    pub fn of<M: Message>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
        }
    }
}

/// Reconstructs one registered Message type from its payload
pub trait MessageBuilder: Send + Sync {
    fn name(&self) -> &'static str;
    fn read(&self, reader: &mut ByteReader) -> Result<Box<dyn Message>, SerdeErr>;
}
