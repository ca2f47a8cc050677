pub mod channels;
pub mod error;
pub mod frame;
pub mod message;
pub mod message_container;
pub mod message_kinds;
pub mod message_queue;
pub mod message_queue_config;
pub mod packet_builder;
pub mod pending_packet;

#[cfg(test)]
pub(crate) mod test_messages;
