use core::hash::Hash;

use jm_utils::PublishMap;

use crate::ConvertError;
use crate::adapter::Converter;

/// Memoizes both directions of a converter.
///
/// Meant for types with few distinct values, such as locales. Each direction
/// stops growing after `capacity` entries; later values are converted
/// without being cached.
///
/// ```
/// use jm_mapper::adapter::CachedConverter;
/// use jm_mapper::{ConvertError, Converter};
///
/// struct Upper;
///
/// impl Converter<String> for Upper {
///     fn write(&self, value: &String) -> String {
///         value.to_uppercase()
///     }
///
///     fn read(&self, text: &str) -> Result<String, ConvertError> {
///         Ok(text.to_lowercase())
///     }
/// }
///
/// let cached = CachedConverter::new(Upper, 16);
/// assert_eq!(cached.write(&"fr".to_owned()), "FR");
/// assert_eq!(cached.read("FR").unwrap(), "fr");
/// assert_eq!(cached.len(), 2);
/// ```
pub struct CachedConverter<T, C> {
    inner: C,
    capacity: usize,
    written: PublishMap<T, String>,
    read: PublishMap<String, T>,
}

impl<T, C> CachedConverter<T, C> {
    pub fn new(inner: C, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            written: PublishMap::default(),
            read: PublishMap::default(),
        }
    }

    /// Number of cached entries, both directions together.
    pub fn len(&self) -> usize {
        self.written.len() + self.read.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, C> Converter<T> for CachedConverter<T, C>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
    C: Converter<T>,
{
    fn write(&self, value: &T) -> String {
        if let Some(text) = self.written.get(value) {
            return text;
        }
        let text = self.inner.write(value);
        if self.written.len() < self.capacity {
            self.written.publish(value.clone(), text.clone());
        }
        text
    }

    fn read(&self, text: &str) -> Result<T, ConvertError> {
        let key = text.to_owned();
        if let Some(value) = self.read.get(&key) {
            return Ok(value);
        }
        let value = self.inner.read(text)?;
        if self.read.len() < self.capacity {
            self.read.publish(key, value.clone());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::CachedConverter;
    use crate::ConvertError;
    use crate::adapter::Converter;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Converter<u8> for Counting {
        fn write(&self, value: &u8) -> String {
            self.calls.fetch_add(1, Ordering::Relaxed);
            value.to_string()
        }

        fn read(&self, text: &str) -> Result<u8, ConvertError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            text.parse().map_err(ConvertError::wrap)
        }
    }

    #[test]
    fn repeated_conversions_hit_the_cache() {
        let cached = CachedConverter::new(Counting::default(), 8);
        for _ in 0..3 {
            assert_eq!(cached.write(&7), "7");
            assert_eq!(cached.read("7").unwrap(), 7);
        }
        assert_eq!(cached.inner.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn capacity_bounds_the_cache() {
        let cached = CachedConverter::new(Counting::default(), 1);
        cached.write(&1);
        cached.write(&2);
        cached.write(&2);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.inner.calls.load(Ordering::Relaxed), 3);
        assert!(cached.read("x").is_err());
        assert_eq!(cached.len(), 1);
    }
}
