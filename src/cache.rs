use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::config::{GeneratorMode, ShaderDialect};
use crate::kernel::KernelSpec;
use crate::shader::{self, ShaderPair};

/// Cache key of a generated pair. Sigma is keyed by its bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ShaderKey {
    radius: u32,
    sigma_bits: u32,
    mode: GeneratorMode,
    dialect: ShaderDialect,
}

impl ShaderKey {
    fn new(kernel: KernelSpec, mode: GeneratorMode, dialect: ShaderDialect) -> Self {
        Self {
            radius: kernel.radius(),
            sigma_bits: kernel.sigma().to_bits(),
            mode,
            dialect,
        }
    }
}

/// Generated shader pairs, shared by every pass that uses the same kernel.
pub struct ShaderCache {
    pairs: LruCache<ShaderKey, Arc<ShaderPair>, ahash::RandomState>,
    hits: u64,
    misses: u64,
}

impl ShaderCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            pairs: LruCache::with_hasher(capacity, ahash::RandomState::new()),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Returns the cached pair for the key, generating it on a miss.
    pub fn get_or_generate(
        &mut self,
        kernel: KernelSpec,
        mode: GeneratorMode,
        dialect: ShaderDialect,
    ) -> Arc<ShaderPair> {
        let key = ShaderKey::new(kernel, mode, dialect);

        if let Some(pair) = self.pairs.get(&key) {
            self.hits += 1;
            return Arc::clone(pair);
        }

        self.misses += 1;
        tracing::debug!(
            radius = kernel.radius(),
            sigma = kernel.sigma(),
            ?mode,
            ?dialect,
            "generating blur shader pair"
        );

        let pair = Arc::new(shader::generate(kernel, mode, dialect));
        self.pairs.put(key, Arc::clone(&pair));
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> ShaderCache {
        ShaderCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn identical_keys_share_one_pair() {
        let mut cache = cache(4);
        let kernel = KernelSpec::new(5, 2.0);
        let a = cache.get_or_generate(kernel, GeneratorMode::Naive, ShaderDialect::Glsl);
        let b = cache.get_or_generate(kernel, GeneratorMode::Naive, ShaderDialect::Glsl);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn mode_and_dialect_are_part_of_the_key() {
        let mut cache = cache(8);
        let kernel = KernelSpec::new(5, 2.0);
        let naive = cache.get_or_generate(kernel, GeneratorMode::Naive, ShaderDialect::Glsl);
        let optimized = cache.get_or_generate(kernel, GeneratorMode::Optimized, ShaderDialect::Glsl);
        let wgsl = cache.get_or_generate(kernel, GeneratorMode::Naive, ShaderDialect::Wgsl);
        assert!(!Arc::ptr_eq(&naive, &optimized));
        assert!(!Arc::ptr_eq(&naive, &wgsl));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn least_recently_used_pair_is_evicted() {
        let mut cache = cache(2);
        let first = cache.get_or_generate(
            KernelSpec::new(1, 1.0),
            GeneratorMode::Naive,
            ShaderDialect::Glsl,
        );
        cache.get_or_generate(KernelSpec::new(2, 1.0), GeneratorMode::Naive, ShaderDialect::Glsl);
        cache.get_or_generate(KernelSpec::new(3, 1.0), GeneratorMode::Naive, ShaderDialect::Glsl);
        assert_eq!(cache.len(), 2);

        let regenerated = cache.get_or_generate(
            KernelSpec::new(1, 1.0),
            GeneratorMode::Naive,
            ShaderDialect::Glsl,
        );
        assert!(!Arc::ptr_eq(&first, &regenerated));
        assert_eq!(*first, *regenerated);
        assert_eq!(cache.misses(), 4);
    }
}
