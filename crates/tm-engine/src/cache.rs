//! Decoded-sample cache, keyed by track

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tm_codec::AudioBuffer;

use crate::track::TrackId;

/// Decoded buffers for one track set.
///
/// Lives inside the track set it serves, so replacing or resetting the set
/// drops the cache with it. Disabled caches never store anything.
#[derive(Debug, Default)]
pub(crate) struct DecodeCache {
    enabled: bool,
    entries: RwLock<HashMap<TrackId, Arc<AudioBuffer>>>,
}

impl DecodeCache {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, id: TrackId) -> Option<Arc<AudioBuffer>> {
        self.entries.read().get(&id).cloned()
    }

    /// Store `buffer` unless disabled; an entry already present wins
    pub(crate) fn insert(&self, id: TrackId, buffer: Arc<AudioBuffer>) {
        if !self.enabled {
            return;
        }
        self.entries.write().entry(id).or_insert(buffer);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Total cached samples across all channels
    pub(crate) fn sample_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .map(|b| b.frames() * b.num_channels())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = DecodeCache::new(true);
        assert!(cache.get(TrackId(1)).is_none());

        cache.insert(TrackId(1), Arc::new(AudioBuffer::silence(2, 44100, 100)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sample_count(), 200);
        assert_eq!(cache.get(TrackId(1)).map(|b| b.frames()), Some(100));
    }

    #[test]
    fn test_first_entry_wins() {
        let cache = DecodeCache::new(true);
        cache.insert(TrackId(1), Arc::new(AudioBuffer::silence(1, 44100, 10)));
        cache.insert(TrackId(1), Arc::new(AudioBuffer::silence(1, 44100, 20)));
        assert_eq!(cache.get(TrackId(1)).map(|b| b.frames()), Some(10));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = DecodeCache::new(false);
        cache.insert(TrackId(1), Arc::new(AudioBuffer::silence(2, 44100, 100)));
        assert_eq!(cache.len(), 0);
        assert!(cache.get(TrackId(1)).is_none());
    }
}
