use std::collections::HashMap;

/// Aircraft identifier → marker handle. Entries are never removed.
#[derive(Debug)]
pub struct MarkerRegistry<H> {
    markers: HashMap<String, H>,
}

impl<H> MarkerRegistry<H> {
    pub fn new() -> Self {
        Self {
            markers: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.markers.get(id)
    }

    /// Keeps the existing handle if the identifier is already registered.
    pub fn register(&mut self, id: &str, handle: H) -> &H {
        self.markers.entry(id.to_string()).or_insert(handle)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &H)> {
        self.markers.iter()
    }
}

impl<H> Default for MarkerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
