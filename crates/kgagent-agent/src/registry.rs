//! Episode registry - external cancellation of running episodes by id

use crate::episode::EpisodeId;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

pub struct EpisodeRegistry {
    episodes: DashMap<EpisodeId, CancellationToken>,
}

impl Default for EpisodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeRegistry {
    pub fn new() -> Self {
        Self {
            episodes: DashMap::new(),
        }
    }

    /// Track a running episode. The returned token is cancelled by
    /// `cancel(id)` and by cancelling `parent`.
    pub fn register(&self, id: &EpisodeId, parent: &CancellationToken) -> CancellationToken {
        let token = parent.child_token();
        self.episodes.insert(id.clone(), token.clone());
        token
    }

    /// Like `register`, but the entry is removed when the guard drops,
    /// including when the episode future is dropped mid-flight.
    pub fn track(&self, id: &EpisodeId, parent: &CancellationToken) -> EpisodeGuard<'_> {
        let token = self.register(id, parent);
        EpisodeGuard {
            registry: self,
            id: id.clone(),
            token,
        }
    }

    pub fn unregister(&self, id: &EpisodeId) {
        self.episodes.remove(id);
    }

    /// Returns false if no such episode is running.
    pub fn cancel(&self, id: &EpisodeId) -> bool {
        match self.episodes.get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for entry in self.episodes.iter() {
            entry.value().cancel();
        }
    }

    pub fn is_running(&self, id: &EpisodeId) -> bool {
        self.episodes.contains_key(id)
    }

    pub fn list(&self) -> Vec<EpisodeId> {
        self.episodes.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// Registration of one running episode. Unregisters on drop.
pub struct EpisodeGuard<'a> {
    registry: &'a EpisodeRegistry,
    id: EpisodeId,
    token: CancellationToken,
}

impl EpisodeGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_by_id_leaves_parent_alone() {
        let reg = EpisodeRegistry::new();
        let parent = CancellationToken::new();
        let id = EpisodeId::new();
        let token = reg.register(&id, &parent);
        assert!(reg.is_running(&id));
        assert!(reg.cancel(&id));
        assert!(token.is_cancelled());
        assert!(!parent.is_cancelled());
        reg.unregister(&id);
        assert!(!reg.cancel(&id));
        assert!(reg.is_empty());
    }

    #[test]
    fn parent_cancellation_reaches_episode() {
        let reg = EpisodeRegistry::new();
        let parent = CancellationToken::new();
        let token = reg.register(&EpisodeId::new(), &parent);
        parent.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn guard_unregisters_on_drop() {
        let reg = EpisodeRegistry::new();
        let id = EpisodeId::new();
        {
            let guard = reg.track(&id, &CancellationToken::new());
            assert!(reg.is_running(&id));
            assert!(reg.cancel(&id));
            assert!(guard.token().is_cancelled());
        }
        assert!(!reg.is_running(&id));
        assert!(reg.is_empty());
    }
}
