//! Listener set - all-or-nothing subscription to a player's event bus

use crate::{
    player::{Listener, ListenerHandle, Player, PlayerEventKind},
    Result,
};
use tracing::{debug, warn};

/// One subscription handle per [`PlayerEventKind`]
///
/// Only [`ListenerSet::subscribe_all`] builds a set, and it either subscribes
/// every kind or none, so a partially populated set cannot exist.
#[derive(Debug)]
pub struct ListenerSet {
    handles: Vec<(PlayerEventKind, ListenerHandle)>,
}

impl ListenerSet {
    /// Subscribe `make_listener(kind)` for every kind on `player`
    ///
    /// On the first failure every handle acquired so far is removed again and
    /// the player's error is returned.
    pub fn subscribe_all<F>(player: &dyn Player, mut make_listener: F) -> Result<Self>
    where
        F: FnMut(PlayerEventKind) -> Listener,
    {
        let mut handles = Vec::with_capacity(PlayerEventKind::ALL.len());

        for kind in PlayerEventKind::ALL {
            match player.add_event_listener(kind, make_listener(kind)) {
                Ok(handle) => handles.push((kind, handle)),
                Err(e) => {
                    warn!(kind = %kind, error = %e, rolled_back = handles.len(), "Subscription failed, rolling back");
                    for (kind, handle) in handles.into_iter().rev() {
                        player.remove_event_listener(kind, handle);
                    }
                    return Err(e);
                }
            }
        }

        debug!(count = handles.len(), "Listeners subscribed");
        Ok(Self { handles })
    }

    /// Remove every subscription from `player`
    pub fn unsubscribe_all(self, player: &dyn Player) {
        let count = self.handles.len();
        for (kind, handle) in self.handles {
            player.remove_event_listener(kind, handle);
        }
        debug!(count, "Listeners removed");
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handle(&self, kind: PlayerEventKind) -> Option<ListenerHandle> {
        self.handles.iter().find(|(k, _)| *k == kind).map(|(_, h)| *h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{player::PlayerEvent, sim::SimulatedPlayer};
    use std::rc::Rc;

    fn noop(_: PlayerEventKind) -> Listener {
        Rc::new(|_: &PlayerEvent| {})
    }

    #[test]
    fn test_subscribe_all_covers_every_kind() {
        let player = SimulatedPlayer::new();
        let set = ListenerSet::subscribe_all(&player, noop).unwrap();

        assert_eq!(set.len(), PlayerEventKind::ALL.len());
        assert_eq!(player.listener_count(), PlayerEventKind::ALL.len());
        for kind in PlayerEventKind::ALL {
            assert!(set.handle(kind).is_some());
            assert_eq!(player.listener_count_for(kind), 1);
        }
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let player = SimulatedPlayer::new();
        player.fail_subscriptions_for(PlayerEventKind::Error);

        let err = ListenerSet::subscribe_all(&player, noop).unwrap_err();

        assert!(matches!(err, crate::Error::Subscribe { kind: PlayerEventKind::Error, .. }));
        assert_eq!(player.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_all_empties_player() {
        let player = SimulatedPlayer::new();
        let set = ListenerSet::subscribe_all(&player, noop).unwrap();
        set.unsubscribe_all(&player);
        assert_eq!(player.listener_count(), 0);
    }
}
