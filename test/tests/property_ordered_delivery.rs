//! PROPERTY-BASED TESTS: ordered reliable delivery
//!
//! Whatever the link does to packets (loss, reordering, duplication), an
//! ordered reliable channel hands every message to the application exactly
//! once and in the order it was enqueued.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use tidewire_shared::MessageContainer;
use tidewire_test::{
    message_queue, test_protocol::ORDERED_RELIABLE, Counter, LinkConditionerConfig,
    LocalConnection, Payload,
};

fn conditioner_strategy() -> impl Strategy<Value = LinkConditionerConfig> {
    (0.0f32..0.5, 0.0f32..1.0, 0.0f32..0.3)
        .prop_map(|(loss, reorder, duplicate)| LinkConditionerConfig::new(loss, reorder, duplicate))
}

fn counter_values(messages: Vec<MessageContainer>) -> Vec<u32> {
    messages
        .into_iter()
        .filter_map(|message| message.downcast::<Counter>().ok())
        .map(|counter| counter.value)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Messages enqueued over several ticks come out in order, once each
    #[test]
    fn prop_ordered_reliable_exactly_once(
        conditioner in conditioner_strategy(),
        seed in any::<u64>(),
        batches in prop::collection::vec(0usize..20, 1..15),
    ) {
        let (sender, receiver) = LocalConnection::pair(conditioner, seed);
        let mut sender = message_queue(sender);
        let mut receiver = message_queue(receiver);

        let total: usize = batches.iter().sum();
        let mut now = Instant::now();
        let mut next_value = 0u32;
        let mut received = Vec::new();

        for tick in 0..3000 {
            if let Some(batch) = batches.get(tick) {
                for _ in 0..*batch {
                    sender.enqueue(Counter { value: next_value }, ORDERED_RELIABLE);
                    next_value += 1;
                }
            }
            sender.send_all(&now);
            received.extend(counter_values(receiver.receive_all()));
            sender.receive_all();

            if tick >= batches.len() && received.len() >= total {
                break;
            }
            now += Duration::from_millis(40);
        }

        prop_assert_eq!(received, (0..total as u32).collect::<Vec<_>>());
    }

    /// Messages of any size still arrive whole and in order
    #[test]
    fn prop_mixed_sizes_arrive_intact(
        sizes in prop::collection::vec(0usize..1100, 1..30),
        seed in any::<u64>(),
    ) {
        let (sender, receiver) =
            LocalConnection::pair(LinkConditionerConfig::new(0.2, 0.5, 0.1), seed);
        let mut sender = message_queue(sender);
        let mut receiver = message_queue(receiver);

        for (index, size) in sizes.iter().enumerate() {
            sender.enqueue(Payload::filled(*size, index as u8), ORDERED_RELIABLE);
        }

        let mut now = Instant::now();
        let mut received = Vec::new();
        for _ in 0..3000 {
            sender.send_all(&now);
            received.extend(
                receiver
                    .receive_all()
                    .into_iter()
                    .filter_map(|message| message.downcast::<Payload>().ok()),
            );
            sender.receive_all();
            if received.len() >= sizes.len() {
                break;
            }
            now += Duration::from_millis(40);
        }

        prop_assert_eq!(received.len(), sizes.len());
        for (index, payload) in received.iter().enumerate() {
            prop_assert_eq!(&payload.bytes, &vec![index as u8; sizes[index]]);
        }
    }
}
