use std::sync::Arc;

use linktree_core::{
    HookResult, Info, Node, NodeBehavior, NodeEvent, NodeType, Result, Subscriber, Topic,
};
use parking_lot::Mutex;

/// Shared, ordered record of hook calls as `"<path>:<hook>"`
#[derive(Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl HookLog {
    pub fn record(&self, node: &Node, hook: &str) {
        self.0.lock().push(format!("{}:{}", node.path(), hook));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries for one hook, in call order, as paths
    pub fn paths_for(&self, hook: &str) -> Vec<String> {
        let suffix = format!(":{}", hook);
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, hook: &str) -> usize {
        self.paths_for(hook).len()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Container with no declared children that records every hook
#[derive(Default)]
pub struct Recorder {
    pub log: HookLog,
}

impl Recorder {
    #[allow(dead_code)]
    pub fn node(log: &HookLog) -> Node {
        Node::from_behavior(Recorder { log: log.clone() }).unwrap()
    }
}

impl NodeBehavior for Recorder {
    fn on_started(&self, node: &Node) -> HookResult {
        self.log.record(node, "on_started");
        Ok(())
    }

    fn on_stable(&self, node: &Node) -> HookResult {
        self.log.record(node, "on_stable");
        Ok(())
    }

    fn on_stopped(&self, node: &Node) -> HookResult {
        self.log.record(node, "on_stopped");
        Ok(())
    }

    fn on_child_added(&self, node: &Node, _child: &Info) -> HookResult {
        self.log.record(node, "on_child_added");
        Ok(())
    }

    fn on_child_removed(&self, node: &Node, _child: &Info) -> HookResult {
        self.log.record(node, "on_child_removed");
        Ok(())
    }

    fn on_child_changed(&self, node: &Node, _child: &Info) -> HookResult {
        self.log.record(node, "on_child_changed");
        Ok(())
    }

    fn on_info_changed(&self, node: &Node, _child: &Info) -> HookResult {
        self.log.record(node, "on_info_changed");
        Ok(())
    }
}

impl NodeType for Recorder {
    const TYPE_NAME: &'static str = "recorder";
}

/// One permanent `count` (default 0) and one permanent `label`
///
/// Records the subscription transition hooks.
#[derive(Default)]
pub struct Counter {
    pub log: HookLog,
}

impl Counter {
    #[allow(dead_code)]
    pub fn node(log: &HookLog) -> Node {
        Node::from_behavior(Counter { log: log.clone() }).unwrap()
    }
}

impl NodeBehavior for Counter {
    fn declare_defaults(&self, node: &Node) -> Result<()> {
        node.declare_default("count", 0)?;
        node.declare_default("label", "counter")?;
        Ok(())
    }

    fn on_subscribe(
        &self,
        node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
        _subscriber: &Arc<dyn Subscriber>,
    ) -> HookResult {
        self.log.record(node, "on_subscribe");
        Ok(())
    }

    fn on_subscribed_to(&self, node: &Node, _topic: &Topic, _child: Option<&Info>) -> HookResult {
        self.log.record(node, "on_subscribed_to");
        Ok(())
    }

    fn on_subscribed(&self, node: &Node) -> HookResult {
        self.log.record(node, "on_subscribed");
        Ok(())
    }

    fn on_unsubscribe(
        &self,
        node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
        _subscriber: &Arc<dyn Subscriber>,
    ) -> HookResult {
        self.log.record(node, "on_unsubscribe");
        Ok(())
    }

    fn on_unsubscribed_from(
        &self,
        node: &Node,
        _topic: &Topic,
        _child: Option<&Info>,
    ) -> HookResult {
        self.log.record(node, "on_unsubscribed_from");
        Ok(())
    }

    fn on_unsubscribed(&self, node: &Node) -> HookResult {
        self.log.record(node, "on_unsubscribed");
        Ok(())
    }
}

impl NodeType for Counter {
    const TYPE_NAME: &'static str = "counter";
}

/// Nested defaults: a permanent `primary` counter, a permanent `enabled`
/// flag and a removable `notes` string
#[derive(Default)]
pub struct Folder;

impl NodeBehavior for Folder {
    fn declare_defaults(&self, node: &Node) -> Result<()> {
        node.declare_default("primary", Node::new::<Counter>()?)?;
        node.declare_default("enabled", true)?;
        node.add("notes", "")?;
        Ok(())
    }
}

impl NodeType for Folder {
    const TYPE_NAME: &'static str = "folder";
}

/// `setpoint` tracks the live default on copy
#[derive(Default)]
pub struct Thermostat;

impl NodeBehavior for Thermostat {
    fn declare_defaults(&self, node: &Node) -> Result<()> {
        node.declare_default("setpoint", 20)?.set_default_on_copy(true)?;
        node.declare_default("mode", "auto")?;
        Ok(())
    }
}

impl NodeType for Thermostat {
    const TYPE_NAME: &'static str = "thermostat";
}

/// One delivered event: topic, event and the child's name
pub type Delivery = (Topic, NodeEvent, Option<String>);

/// Subscriber that remembers everything it is told
#[derive(Default)]
pub struct Collector {
    events: Mutex<Vec<Delivery>>,
    closed: Mutex<Vec<Topic>>,
}

#[allow(dead_code)]
impl Collector {
    pub fn new() -> Arc<Collector> {
        Arc::new(Collector::default())
    }

    pub fn events(&self) -> Vec<Delivery> {
        self.events.lock().clone()
    }

    pub fn closed(&self) -> Vec<Topic> {
        self.closed.lock().clone()
    }
}

impl Subscriber for Collector {
    fn on_event(
        &self,
        topic: &Topic,
        event: &NodeEvent,
        _node: &Node,
        child: Option<&Info>,
    ) -> HookResult {
        self.events.lock().push((
            topic.clone(),
            event.clone(),
            child.map(|c| c.name().to_string()),
        ));
        Ok(())
    }

    fn on_closed(&self, topic: &Topic, _node: &Node, _child: Option<&Info>) {
        self.closed.lock().push(topic.clone());
    }
}
