use crate::ids::HolderId;

/// Scene-scoped "holder teleported" channel.
///
/// Controllers register on activation and must deregister on teardown;
/// raises for unsubscribed holders are dropped. Events are buffered and
/// drained once at the top of the next fixed step, so a teleport can never
/// stretch a held body across the discontinuity for more than one tick.
#[derive(Default, Debug)]
pub struct TeleportBus {
    subscribers: Vec<HolderId>,
    pending: Vec<HolderId>,
}

impl TeleportBus {
    pub fn new() -> Self { Self::default() }

    pub fn subscribe(&mut self, h: HolderId) {
        if !self.subscribers.contains(&h) {
            self.subscribers.push(h);
        }
    }

    pub fn unsubscribe(&mut self, h: HolderId) {
        self.subscribers.retain(|s| *s != h);
        self.pending.retain(|s| *s != h);
    }

    pub fn is_subscribed(&self, h: HolderId) -> bool { self.subscribers.contains(&h) }

    /// Raise a teleport notification for `h`. No-op unless subscribed.
    pub fn raise(&mut self, h: HolderId) {
        if self.subscribers.contains(&h) && !self.pending.contains(&h) {
            self.pending.push(h);
        }
    }

    /// Take all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<HolderId> {
        core::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_requires_subscription() {
        let mut bus = TeleportBus::new();
        bus.raise(HolderId(1));
        assert!(bus.drain().is_empty());

        bus.subscribe(HolderId(1));
        bus.raise(HolderId(1));
        assert_eq!(bus.drain(), vec![HolderId(1)]);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn unsubscribe_discards_pending() {
        let mut bus = TeleportBus::new();
        bus.subscribe(HolderId(7));
        bus.raise(HolderId(7));
        bus.unsubscribe(HolderId(7));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn duplicate_raise_coalesces() {
        let mut bus = TeleportBus::new();
        bus.subscribe(HolderId(2));
        bus.raise(HolderId(2));
        bus.raise(HolderId(2));
        assert_eq!(bus.drain().len(), 1);
    }
}
