use std::marker::PhantomData;

/// Conversion between a typed handle and its raw slot index.
pub trait Handle: Copy {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

/// Slot storage addressed by typed handles.
///
/// Freed slots are reused, so a stale handle may alias a newer resource of
/// the same kind. Owners are expected to drop handles when they destroy the
/// resource.
#[derive(Debug)]
pub struct Arena<H, T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    _handle: PhantomData<H>,
}

impl<H: Handle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            _handle: PhantomData,
        }
    }
}

impl<H: Handle, T> Arena<H, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> H {
        if let Some(raw) = self.free.pop() {
            self.slots[raw as usize] = Some(value);
            return H::from_raw(raw);
        }
        let raw = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        assert!(raw != u32::MAX, "arena exhausted");
        self.slots.push(Some(value));
        H::from_raw(raw)
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(handle.raw() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots.get_mut(handle.raw() as usize)?.as_mut()
    }

    pub fn remove(&mut self, handle: H) -> Option<T> {
        let value = self.slots.get_mut(handle.raw() as usize)?.take()?;
        self.free.push(handle.raw());
        Some(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (H::from_raw(i as u32), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::TextureId;

    #[test]
    fn removed_slots_are_reused() {
        let mut arena: Arena<TextureId, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);

        let c = arena.insert("c");
        assert_eq!(c, a);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn double_remove_is_harmless() {
        let mut arena: Arena<TextureId, u8> = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        assert_eq!(arena.remove(a), None);
        assert!(arena.is_empty());
    }
}
