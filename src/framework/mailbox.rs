//! # Mailbox
//!
//! Per-actor FIFO queue plus a stash buffer. Selective removal ([`Mailbox::pick`]) never
//! reorders what remains, and unstashed messages go back to the front of the queue.

use std::collections::VecDeque;

#[derive(Debug)]
pub struct Mailbox<M> {
    queue: VecDeque<M>,
    stash: Vec<M>,
}

impl<M> Default for Mailbox<M> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            stash: Vec::new(),
        }
    }
}

impl<M> Mailbox<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, msg: M) {
        self.queue.push_back(msg);
    }

    pub fn dequeue(&mut self) -> Option<M> {
        self.queue.pop_front()
    }

    /// Removes the first message accepted by `predicate`, scanning head to tail.
    pub fn pick(&mut self, mut predicate: impl FnMut(&M) -> bool) -> Option<M> {
        let index = self.queue.iter().position(|msg| predicate(msg))?;
        self.queue.remove(index)
    }

    /// Moves a message out of normal consideration.
    pub fn stash(&mut self, msg: M) {
        self.stash.push(msg);
    }

    /// Puts every stashed message back at the front, in stash order.
    pub fn unstash_all(&mut self) {
        self.unstash_where(|_| true);
    }

    /// Puts the stashed messages accepted by `filter` back at the front, in stash order.
    /// The rest of the stash is discarded.
    pub fn unstash_where(&mut self, mut filter: impl FnMut(&M) -> bool) {
        for msg in self.stash.drain(..).rev() {
            if filter(&msg) {
                self.queue.push_front(msg);
            }
        }
    }

    /// Length of the live queue; stashed messages are not counted.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stashed(&self) -> usize {
        self.stash.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &M> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(mailbox: &Mailbox<&'static str>) -> Vec<&'static str> {
        mailbox.iter().copied().collect()
    }

    #[test]
    fn test_fifo() {
        let mut mailbox = Mailbox::new();
        mailbox.enqueue("m1");
        mailbox.enqueue("m2");
        mailbox.enqueue("m3");
        assert_eq!(mailbox.dequeue(), Some("m1"));
        assert_eq!(mailbox.dequeue(), Some("m2"));
        assert_eq!(mailbox.dequeue(), Some("m3"));
        assert_eq!(mailbox.dequeue(), None);
    }

    #[test]
    fn test_pick_keeps_remaining_order() {
        let mut mailbox = Mailbox::new();
        for msg in ["m1", "m2", "m3"] {
            mailbox.enqueue(msg);
        }
        assert_eq!(mailbox.pick(|m| *m == "m2"), Some("m2"));
        assert_eq!(contents(&mailbox), vec!["m1", "m3"]);
        assert_eq!(mailbox.pick(|m| *m == "m9"), None);
        assert_eq!(mailbox.len(), 2);
    }

    #[test]
    fn test_unstash_goes_to_front() {
        let mut mailbox = Mailbox::new();
        mailbox.enqueue("live");
        mailbox.stash("s1");
        mailbox.stash("s2");
        assert_eq!(mailbox.len(), 1);
        assert_eq!(mailbox.stashed(), 2);

        mailbox.unstash_all();
        assert_eq!(contents(&mailbox), vec!["s1", "s2", "live"]);
        assert_eq!(mailbox.stashed(), 0);
    }

    #[test]
    fn test_unstash_where_discards_rejected() {
        let mut mailbox = Mailbox::new();
        mailbox.enqueue("live");
        for msg in ["keep1", "drop", "keep2"] {
            mailbox.stash(msg);
        }
        mailbox.unstash_where(|m| m.starts_with("keep"));
        assert_eq!(contents(&mailbox), vec!["keep1", "keep2", "live"]);
        assert_eq!(mailbox.stashed(), 0);

        // Unstashing an empty stash is a no-op.
        mailbox.unstash_all();
        assert_eq!(mailbox.len(), 3);
    }
}
