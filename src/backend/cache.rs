use image::DynamicImage;
use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use super::loader::{ResourceRef, SizeHint};
use crate::render::{TerminalGrid, Viewport, render_image};

pub const DEFAULT_CAPACITY: usize = 32;
pub const DEFAULT_IMAGE_CAPACITY: usize = 16;

/// Least-recently-used map with a fixed number of entries.
struct Lru<K, V> {
    entries: HashMap<K, V>,
    access_order: Vec<K>,
    capacity: usize,
}

impl<K: Clone + Eq + Hash, V> Lru<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            access_order: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if !self.contains(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key)
    }

    fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &V {
        if self.contains(&key) {
            self.touch(&key);
        } else {
            let value = make();
            self.insert(key.clone(), value);
        }
        &self.entries[&key]
    }

    fn touch(&mut self, key: &K) {
        self.access_order.retain(|k| k != key);
        self.access_order.push(key.clone());
    }

    fn insert(&mut self, key: K, value: V) {
        if !self.contains(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.access_order.first().cloned() {
                self.entries.remove(&oldest);
                self.access_order.remove(0);
            }
        }

        self.touch(&key);
        self.entries.insert(key, value);
    }
}

/// In-memory LRU of rasterized grids.
///
/// Rasterizing is pure, so serving a cached grid for the same resource and
/// viewport is indistinguishable from rendering it again.
pub struct GridCache {
    grids: Lru<(ResourceRef, Viewport), TerminalGrid>,
}

impl GridCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            grids: Lru::new(capacity),
        }
    }

    pub fn get_or_render(
        &mut self,
        resource: &ResourceRef,
        image: &DynamicImage,
        viewport: Viewport,
    ) -> &TerminalGrid {
        let cached = self.grids.len();
        self.grids
            .get_or_insert_with((resource.clone(), viewport), || {
                let grid = render_image(image, viewport);
                debug!(
                    "rasterized {:?} at {}x{}: {}/{} cells set ({} grids cached)",
                    resource,
                    viewport.cols,
                    viewport.rows,
                    grid.set_count(),
                    grid.len(),
                    cached
                );
                grid
            })
    }
}

impl Default for GridCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Decoded images, so revisiting a cover or page skips the network.
pub struct ImageCache {
    images: Lru<(ResourceRef, SizeHint), Arc<DynamicImage>>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            images: Lru::new(capacity),
        }
    }

    pub fn get(&mut self, resource: &ResourceRef, size: SizeHint) -> Option<Arc<DynamicImage>> {
        self.images.get(&(resource.clone(), size)).cloned()
    }

    pub fn insert(&mut self, resource: ResourceRef, size: SizeHint, image: Arc<DynamicImage>) {
        self.images.insert((resource, size), image);
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn page(n: usize) -> ResourceRef {
        ResourceRef::Page {
            url: format!("https://node/{}.png", n),
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([3, 4, 5])))
    }

    #[test]
    fn test_cached_grid_matches_fresh_render() {
        let mut cache = GridCache::new(4);
        let img = image();
        let viewport = Viewport::new(4, 2);

        let cached = cache.get_or_render(&page(0), &img, viewport).clone();
        assert_eq!(cached, render_image(&img, viewport));
        assert_eq!(cache.get_or_render(&page(0), &img, viewport), &cached);
        assert_eq!(cache.grids.len(), 1);
    }

    #[test]
    fn test_viewport_is_part_of_the_key() {
        let mut cache = GridCache::new(4);
        let img = image();
        cache.get_or_render(&page(0), &img, Viewport::new(4, 2));
        cache.get_or_render(&page(0), &img, Viewport::new(2, 2));
        assert_eq!(cache.grids.len(), 2);
    }

    #[test]
    fn test_revisit_serves_earlier_grid() {
        let mut cache = GridCache::new(4);
        let viewport = Viewport::new(2, 1);
        let first = cache.get_or_render(&page(0), &image(), viewport).clone();
        cache.get_or_render(&page(1), &image(), viewport);

        // A different image under the same key proves nothing is re-rendered.
        let other = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9])));
        assert_eq!(cache.get_or_render(&page(0), &other, viewport), &first);
        assert_eq!(cache.grids.len(), 2);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = GridCache::new(2);
        let img = image();
        let viewport = Viewport::new(2, 1);

        cache.get_or_render(&page(0), &img, viewport);
        cache.get_or_render(&page(1), &img, viewport);
        // Touch 0 so that 1 becomes the oldest.
        cache.get_or_render(&page(0), &img, viewport);
        cache.get_or_render(&page(2), &img, viewport);

        assert_eq!(cache.grids.len(), 2);
        assert!(cache.grids.contains(&(page(0), viewport)));
        assert!(!cache.grids.contains(&(page(1), viewport)));
        assert!(cache.grids.contains(&(page(2), viewport)));
    }

    #[test]
    fn test_zero_capacity_still_serves() {
        let mut cache = GridCache::new(0);
        let grid = cache.get_or_render(&page(0), &image(), Viewport::new(1, 1));
        assert_eq!(grid.set_count(), 1);
    }

    #[test]
    fn test_image_cache_keys_on_size() {
        let mut cache = ImageCache::new(2);
        let img = Arc::new(image());
        cache.insert(page(0), SizeHint::Small, img.clone());

        assert!(cache.get(&page(0), SizeHint::Small).is_some());
        assert!(cache.get(&page(0), SizeHint::Medium).is_none());
        assert!(cache.get(&page(1), SizeHint::Small).is_none());

        cache.insert(page(1), SizeHint::Small, img.clone());
        // Reading page 0 makes page 1 the oldest.
        assert!(cache.get(&page(0), SizeHint::Small).is_some());
        cache.insert(page(2), SizeHint::Small, img);
        assert!(cache.get(&page(0), SizeHint::Small).is_some());
        assert!(cache.get(&page(1), SizeHint::Small).is_none());
        assert!(cache.get(&page(2), SizeHint::Small).is_some());
    }

    #[test]
    fn test_reinserting_does_not_evict() {
        let mut cache = ImageCache::new(2);
        let img = Arc::new(image());
        cache.insert(page(0), SizeHint::Small, img.clone());
        cache.insert(page(1), SizeHint::Small, img.clone());
        cache.insert(page(1), SizeHint::Small, img);
        assert_eq!(cache.images.len(), 2);
    }
}
