use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Next offset to commit per partition, as advanced by marking messages.
#[derive(Debug, Default)]
pub struct MarkedOffsets {
    next: Mutex<HashMap<(String, i32), i64>>,
}

impl MarkedOffsets {
    /// Records that the message at `offset` was processed. Returns the new next
    /// offset (`offset + 1`) if it moved forward, `None` if it was already covered.
    pub fn mark(&self, topic: &str, partition: i32, offset: i64) -> Option<i64> {
        let next_offset = offset + 1;
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        match next.get_mut(&(topic.to_string(), partition)) {
            Some(current) if *current >= next_offset => None,
            Some(current) => {
                *current = next_offset;
                Some(next_offset)
            }
            None => {
                next.insert((topic.to_string(), partition), next_offset);
                Some(next_offset)
            }
        }
    }

    pub fn next_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        self.next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(topic.to_string(), partition))
            .copied()
    }
}
