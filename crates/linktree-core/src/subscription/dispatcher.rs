//! Subscription list with transition counting
//!
//! Pure bookkeeping: every mutation reports which "first"/"last"
//! transitions it caused, and the caller runs the matching hooks after
//! releasing the node's subscription lock.

use std::sync::Arc;

use super::{Subscriber, Topic};
use crate::node::Info;

pub(crate) struct Subscription {
    pub topic: Topic,
    pub child: Option<Info>,
    pub subscriber: Arc<dyn Subscriber>,
}

/// Transitions caused by one insert or removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Transitions {
    /// First or last subscription for the (topic, child) pair
    pub pair: bool,
    /// First or last subscription on the node
    pub node: bool,
}

pub(crate) fn same_child(a: Option<&Info>, b: Option<&Info>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

fn same_subscriber(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl Subscription {
    fn same_pair(&self, topic: &Topic, child: Option<&Info>) -> bool {
        self.topic == *topic && same_child(self.child.as_ref(), child)
    }

    fn is(&self, topic: &Topic, child: Option<&Info>, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.same_pair(topic, child) && same_subscriber(&self.subscriber, subscriber)
    }
}

#[derive(Default)]
pub(crate) struct SubscriptionList {
    subs: Vec<Subscription>,
}

impl SubscriptionList {
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Append unless the identical triple is present
    ///
    /// Returns `None` for a duplicate.
    pub fn insert(&mut self, sub: Subscription) -> Option<Transitions> {
        if self
            .subs
            .iter()
            .any(|s| s.is(&sub.topic, sub.child.as_ref(), &sub.subscriber))
        {
            return None;
        }
        let transitions = Transitions {
            pair: !self
                .subs
                .iter()
                .any(|s| s.same_pair(&sub.topic, sub.child.as_ref())),
            node: self.subs.is_empty(),
        };
        self.subs.push(sub);
        Some(transitions)
    }

    pub fn remove(
        &mut self,
        topic: &Topic,
        child: Option<&Info>,
        subscriber: &Arc<dyn Subscriber>,
    ) -> Option<(Subscription, Transitions)> {
        let position = self.subs.iter().position(|s| s.is(topic, child, subscriber))?;
        Some(self.remove_at(position))
    }

    fn remove_at(&mut self, position: usize) -> (Subscription, Transitions) {
        let sub = self.subs.remove(position);
        let transitions = Transitions {
            pair: !self
                .subs
                .iter()
                .any(|s| s.same_pair(&sub.topic, sub.child.as_ref())),
            node: self.subs.is_empty(),
        };
        (sub, transitions)
    }

    /// Remove every subscription filtered on exactly `child`
    pub fn remove_child(&mut self, child: &Info) -> Vec<(Subscription, Transitions)> {
        let mut removed = Vec::new();
        while let Some(position) = self
            .subs
            .iter()
            .position(|s| s.child.as_ref().is_some_and(|c| c.ptr_eq(child)))
        {
            removed.push(self.remove_at(position));
        }
        removed
    }

    /// Remove everything, oldest first
    pub fn drain(&mut self) -> Vec<(Subscription, Transitions)> {
        let mut removed = Vec::with_capacity(self.subs.len());
        while !self.subs.is_empty() {
            removed.push(self.remove_at(0));
        }
        removed
    }

    /// Subscribers an event on (topic, child) is delivered to, in order
    pub fn recipients(&self, topic: &Topic, child: Option<&Info>) -> Vec<Arc<dyn Subscriber>> {
        self.subs
            .iter()
            .filter(|s| s.topic == *topic && topic.accepts(s.child.as_ref(), child))
            .map(|s| s.subscriber.clone())
            .collect()
    }
}
