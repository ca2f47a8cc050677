use crate::{constants::SEQUENCE_WINDOW, types::MessageIndex};

/// Returns the forward distance from `b` to `a` on the 16-bit sequence ring.
///
/// sequence_distance(5, 3) will return 2
/// sequence_distance(0, 65535) will return 1
pub fn sequence_distance(a: MessageIndex, b: MessageIndex) -> u16 {
    a.wrapping_sub(b)
}

/// Returns whether sequence `a` is ahead of sequence `b` within the
/// half-range window. Every sequence comparison in the crate goes through
/// this function: the sequenced-unreliable pick, ack freshness and the
/// duplicate filter applied when deframing ordered channels.
///
/// sequence_newer(2, 1) will return true
/// sequence_newer(1, 2) will return false
/// sequence_newer(1, 1) will return false
/// sequence_newer(0, 65535) will return true
pub fn sequence_newer(a: MessageIndex, b: MessageIndex) -> bool {
    let distance = sequence_distance(a, b);
    distance > 0 && distance < SEQUENCE_WINDOW
}
