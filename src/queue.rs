//! Append-only event queue.
//!
//! The queue is a singly linked sequence of immutable nodes. A node's forward
//! link is a [`OnceLock`]: written exactly once by the admitting thread, after
//! the node's payload is fully constructed. Publish-once links make the drain
//! side lock-free — the dispatch thread only ever follows links that are
//! already fully published, while producers append under the admission lock.
//!
//! Nothing is removed explicitly; the prefix behind the drain cursor becomes
//! unreachable and is reclaimed by `Arc` as the cursor advances.

use std::sync::{Arc, OnceLock};

use crate::event::PenEvent;

#[derive(Debug)]
pub(crate) struct QueueNode {
    /// `None` only for the sentinel the queue starts from.
    event: Option<PenEvent>,
    next: OnceLock<Arc<QueueNode>>,
}

impl QueueNode {
    fn next(&self) -> Option<&Arc<QueueNode>> {
        self.next.get()
    }

    pub fn event(&self) -> &PenEvent {
        self.event
            .as_ref()
            .expect("drain cursor never yields the sentinel")
    }
}

/// Append side: the most recently scheduled node. Mutated only under the
/// admission lock.
#[derive(Debug)]
pub(crate) struct EventQueue {
    last_scheduled: Arc<QueueNode>,
}

impl EventQueue {
    /// Creates an empty queue and the drain cursor paired with it, both
    /// pointing at a shared sentinel.
    pub fn new() -> (EventQueue, DrainCursor) {
        let sentinel = Arc::new(QueueNode {
            event: None,
            next: OnceLock::new(),
        });
        (
            EventQueue {
                last_scheduled: Arc::clone(&sentinel),
            },
            DrainCursor { node: sentinel },
        )
    }

    /// Links a new node after the tail and advances the tail to it.
    ///
    /// The link write is the last visible mutation: the node is fully built
    /// before it becomes reachable.
    pub fn append(&mut self, event: PenEvent) {
        let node = Arc::new(QueueNode {
            event: Some(event),
            next: OnceLock::new(),
        });
        if self.last_scheduled.next.set(Arc::clone(&node)).is_err() {
            // Two appenders racing past the admission lock would be a
            // serialization bug upstream; refuse to corrupt the queue.
            panic!("event queue tail linked twice");
        }
        self.last_scheduled = node;
    }
}

/// Drain side: the most recently dispatched node. Owned by the dispatch
/// thread, and handed over intact when the worker is replaced.
#[derive(Debug)]
pub(crate) struct DrainCursor {
    node: Arc<QueueNode>,
}

impl DrainCursor {
    /// Whether an undispatched event is linked after the cursor.
    pub fn has_pending(&self) -> bool {
        self.node.next().is_some()
    }

    /// Advances past the next published node and returns it, or `None` when
    /// the queue is caught up.
    pub fn take_next(&mut self) -> Option<Arc<QueueNode>> {
        let next = Arc::clone(self.node.next()?);
        self.node = Arc::clone(&next);
        Some(next)
    }
}

impl Drop for DrainCursor {
    fn drop(&mut self) {
        // Unlink a long undispatched backlog iteratively; dropping the chain
        // head recursively could overflow the stack.
        while self.take_next().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Scroll, ScrollDirection, ScrollEvent};

    fn scroll_event(magnitude: f32) -> PenEvent {
        PenEvent::Scroll(ScrollEvent {
            time_millis: 0,
            scroll: Scroll {
                direction: ScrollDirection::Down,
                magnitude,
            },
        })
    }

    fn magnitude(node: &QueueNode) -> f32 {
        match node.event() {
            PenEvent::Scroll(e) => e.scroll.magnitude,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn drains_in_append_order() {
        let (mut queue, mut cursor) = EventQueue::new();
        assert!(!cursor.has_pending());

        for m in [1.0, 2.0, 3.0] {
            queue.append(scroll_event(m));
        }
        assert!(cursor.has_pending());

        let drained: Vec<f32> = std::iter::from_fn(|| cursor.take_next())
            .map(|n| magnitude(&n))
            .collect();
        assert_eq!(drained, vec![1.0, 2.0, 3.0]);
        assert!(!cursor.has_pending());
    }

    #[test]
    fn cursor_catches_up_and_resumes() {
        let (mut queue, mut cursor) = EventQueue::new();
        queue.append(scroll_event(1.0));
        assert_eq!(magnitude(&cursor.take_next().unwrap()), 1.0);
        assert!(cursor.take_next().is_none());

        queue.append(scroll_event(2.0));
        assert_eq!(magnitude(&cursor.take_next().unwrap()), 2.0);
        assert!(cursor.take_next().is_none());
    }

    #[test]
    fn dropping_a_backlogged_cursor_does_not_recurse() {
        let (mut queue, cursor) = EventQueue::new();
        for i in 0..100_000 {
            queue.append(scroll_event(i as f32));
        }
        drop(cursor);
        drop(queue);
    }
}
