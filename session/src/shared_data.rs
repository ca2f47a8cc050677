use tidewire_shared::{AsAny, ByteReader, ByteWriter, SerdeErr};

use crate::peer_id::PeerId;

/// State replicated through the session: one session-wide object owned by
/// the host, and one object per peer owned by that peer.
///
/// The owner mutates its object and raises the modified flag; the session
/// pushes the whole object on the next `update` and clears the flag.
pub trait SharedData: AsAny + Send + 'static {
    fn is_modified(&self) -> bool;
    fn mark_unmodified(&mut self);
    fn serialize(&self, writer: &mut ByteWriter);
    /// Overwrites this object with a blob produced by `serialize`
    fn deserialize(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr>;
}

impl<'a> dyn SharedData + 'a {
    pub fn downcast_ref<T: SharedData>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: SharedData>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.serialize(&mut writer);
        writer.to_bytes()
    }
}

/// Creates the application's SharedData objects
pub trait SharedDataFactory: Send {
    fn make_session_data(&self) -> Box<dyn SharedData>;
    fn make_peer_data(&self, peer_id: PeerId) -> Box<dyn SharedData>;
}
