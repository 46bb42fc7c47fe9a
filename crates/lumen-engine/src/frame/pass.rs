/// Index of one pass-constants element.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PassHandle(u32);

impl PassHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Hands out pass-constant slots by name.
///
/// The pass-constants upload buffer of every frame slot is sized from
/// [`PassAllocator::count`] once allocation is finished.
#[derive(Debug, Default)]
pub struct PassAllocator {
    names: Vec<&'static str>,
}

impl PassAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, name: &'static str) -> PassHandle {
        assert!(
            !self.names.contains(&name),
            "pass `{name}` allocated twice"
        );
        self.names.push(name);
        PassHandle(self.names.len() as u32 - 1)
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, handle: PassHandle) -> &'static str {
        self.names[handle.index()]
    }
}

/// The passes recorded every frame.
#[derive(Debug, Copy, Clone)]
pub struct PassLayout {
    pub main: PassHandle,
    pub cube_faces: [PassHandle; 6],
    pub shadow: PassHandle,
}

impl PassLayout {
    pub fn allocate(alloc: &mut PassAllocator) -> Self {
        const FACES: [&str; 6] = ["cube +x", "cube -x", "cube +y", "cube -y", "cube +z", "cube -z"];
        let main = alloc.allocate("main");
        let cube_faces = FACES.map(|name| alloc.allocate(name));
        let shadow = alloc.allocate("shadow");
        Self {
            main,
            cube_faces,
            shadow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_allocates_eight_distinct_slots() {
        let mut alloc = PassAllocator::new();
        let layout = PassLayout::allocate(&mut alloc);

        assert_eq!(alloc.count(), 8);
        assert_eq!(layout.main.index(), 0);
        assert_eq!(layout.cube_faces[5].index(), 6);
        assert_eq!(alloc.name(layout.shadow), "shadow");
    }
}
