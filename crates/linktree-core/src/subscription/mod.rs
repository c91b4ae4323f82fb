//! Topic subscriptions and event fan-out
//!
//! Each node keeps its own subscription list. Delivery snapshots the
//! matching subscribers under the list lock, releases it, then calls each
//! subscriber in subscription order through the hook helper, so a failing
//! subscriber never stops delivery to the others.

pub(crate) mod dispatcher;

use std::fmt;
use std::sync::Arc;

use crate::errors::{LinkTreeError, Result};
use crate::node::hooks::invoke_hook;
use crate::node::{HookResult, Info, Node};

use dispatcher::{same_child, Subscription, Transitions};

/// Event category a subscriber registers against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Structural changes; matches regardless of the child filter
    Node,
    /// Value changes; the child filter must match exactly
    Value,
    /// Application-defined; no filter matches every child
    Named(Arc<str>),
}

impl Topic {
    pub fn named(name: impl Into<Arc<str>>) -> Topic {
        Topic::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Topic::Node => "node",
            Topic::Value => "value",
            Topic::Named(name) => name,
        }
    }

    /// Does a subscription filtered on `filter` receive an event about `child`?
    pub(crate) fn accepts(&self, filter: Option<&Info>, child: Option<&Info>) -> bool {
        match self {
            Topic::Node => true,
            Topic::Value => same_child(filter, child),
            Topic::Named(_) => filter.is_none() || same_child(filter, child),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    ChildAdded,
    ChildRemoved,
    /// A child's slot was replaced
    ChildChanged,
    /// A child's flags or metadata changed
    InfoChanged,
    /// The node's own value changed
    ValueChanged,
    Custom(Arc<str>),
}

/// Receiver of node events
///
/// Any `Fn(&Topic, &NodeEvent, &Node, Option<&Info>) -> HookResult` closure
/// is a subscriber.
pub trait Subscriber: Send + Sync {
    fn on_event(
        &self,
        topic: &Topic,
        event: &NodeEvent,
        node: &Node,
        child: Option<&Info>,
    ) -> HookResult;

    /// The node cancelled this subscription (child removed or node stopped)
    fn on_closed(&self, _topic: &Topic, _node: &Node, _child: Option<&Info>) {}
}

impl<F> Subscriber for F
where
    F: Fn(&Topic, &NodeEvent, &Node, Option<&Info>) -> HookResult + Send + Sync,
{
    fn on_event(
        &self,
        topic: &Topic,
        event: &NodeEvent,
        node: &Node,
        child: Option<&Info>,
    ) -> HookResult {
        self(topic, event, node, child)
    }
}

impl Node {
    /// Subscribe to `topic`, optionally filtered on one child record
    ///
    /// Subscribing the same (topic, child, subscriber) again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ForeignInfo` if `child` is not a record of this node.
    pub fn subscribe(
        &self,
        topic: Topic,
        child: Option<&Info>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<()> {
        if let Some(child) = child {
            if !child.is_owned_by(self) {
                return Err(LinkTreeError::ForeignInfo {
                    path: self.path(),
                    name: child.name().to_string(),
                });
            }
        }
        let inserted = self.0.subscriptions.lock().insert(Subscription {
            topic: topic.clone(),
            child: child.cloned(),
            subscriber: subscriber.clone(),
        });
        let Some(transitions) = inserted else {
            return Ok(());
        };

        tracing::debug!(path = %self.path(), topic = %topic, "subscribed");
        invoke_hook(self, "on_subscribe", || {
            self.behavior().on_subscribe(self, &topic, child, &subscriber)
        });
        if transitions.pair {
            invoke_hook(self, "on_subscribed_to", || {
                self.behavior().on_subscribed_to(self, &topic, child)
            });
        }
        if transitions.node {
            invoke_hook(self, "on_subscribed", || self.behavior().on_subscribed(self));
        }
        Ok(())
    }

    /// Remove a subscription; returns whether one was found
    pub fn unsubscribe(
        &self,
        topic: &Topic,
        child: Option<&Info>,
        subscriber: &Arc<dyn Subscriber>,
    ) -> bool {
        let removed = self.0.subscriptions.lock().remove(topic, child, subscriber);
        match removed {
            Some((sub, transitions)) => {
                self.after_unsubscribe(&sub, transitions, false);
                true
            }
            None => false,
        }
    }

    fn after_unsubscribe(&self, sub: &Subscription, transitions: Transitions, closed: bool) {
        let child = sub.child.as_ref();
        tracing::debug!(path = %self.path(), topic = %sub.topic, closed, "unsubscribed");
        invoke_hook(self, "on_unsubscribe", || {
            self.behavior()
                .on_unsubscribe(self, &sub.topic, child, &sub.subscriber)
        });
        if transitions.pair {
            invoke_hook(self, "on_unsubscribed_from", || {
                self.behavior().on_unsubscribed_from(self, &sub.topic, child)
            });
        }
        if transitions.node {
            invoke_hook(self, "on_unsubscribed", || self.behavior().on_unsubscribed(self));
        }
        if closed {
            invoke_hook(self, "subscriber.on_closed", || {
                sub.subscriber.on_closed(&sub.topic, self, child);
                Ok(())
            });
        }
    }

    /// Cancel subscriptions filtered on a removed child
    pub(crate) fn unsubscribe_child(&self, child: &Info) {
        let removed = self.0.subscriptions.lock().remove_child(child);
        for (sub, transitions) in removed {
            self.after_unsubscribe(&sub, transitions, true);
        }
    }

    /// Cancel every subscription (on stop)
    pub(crate) fn cancel_subscriptions(&self) {
        let removed = self.0.subscriptions.lock().drain();
        for (sub, transitions) in removed {
            self.after_unsubscribe(&sub, transitions, true);
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.0.subscriptions.lock().len()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.0.subscriptions.lock().is_empty()
    }

    /// Deliver an event to every matching subscriber, in subscription order
    pub fn fire(&self, topic: &Topic, event: &NodeEvent, child: Option<&Info>) {
        let recipients = self.0.subscriptions.lock().recipients(topic, child);
        for subscriber in recipients {
            invoke_hook(self, "subscriber.on_event", || {
                subscriber.on_event(topic, event, self, child)
            });
        }
    }

    /// Announce a change of this node's own value
    pub fn fire_value_changed(&self) {
        if self.is_running() {
            self.fire(&Topic::Value, &NodeEvent::ValueChanged, None);
        }
    }

    /// A record's flags or metadata changed
    pub(crate) fn info_changed(&self, info: &Info) {
        tracing::debug!(path = %self.path(), child = info.name(), "child info changed");
        if self.is_running() {
            invoke_hook(self, "on_info_changed", || {
                self.behavior().on_info_changed(self, info)
            });
            self.fire(&Topic::Node, &NodeEvent::InfoChanged, Some(info));
        }
    }
}
