//! Holder for the single displayed mesh.

use std::ops::AddAssign;

/// GPU resources freed by a [`Release`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl AddAssign for Released {
    fn add_assign(&mut self, rhs: Self) {
        self.geometries += rhs.geometries;
        self.materials += rhs.materials;
        self.textures += rhs.textures;
    }
}

/// Explicit teardown of GPU-backed scene content. Takes `self` by value so
/// a resource can only be released once.
pub trait Release {
    fn release(self) -> Released;
}

/// At most one live value; installing a new one releases the old first.
#[derive(Debug)]
pub struct Slot<T: Release> {
    current: Option<T>,
}

impl<T: Release> Default for Slot<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T: Release> Slot<T> {
    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Releases the current value, if any.
    pub fn clear(&mut self) -> Option<Released> {
        let released = self.current.take().map(Release::release);
        if let Some(r) = released {
            log::info!(
                "Released {} geometries, {} materials, {} textures.",
                r.geometries,
                r.materials,
                r.textures
            );
        }
        released
    }

    /// Releases the old value, then installs `value`.
    pub fn replace(&mut self, value: T) -> Option<Released> {
        let released = self.clear();
        self.current = Some(value);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Stand-in mesh recording every freed resource id.
    struct FakeMesh {
        parts: Vec<u32>,
        textures: Vec<u32>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Release for FakeMesh {
        fn release(self) -> Released {
            let mut log = self.log.borrow_mut();
            for p in &self.parts {
                log.push(format!("geometry {p}"));
            }
            for t in &self.textures {
                log.push(format!("texture {t}"));
            }
            Released {
                geometries: self.parts.len(),
                materials: self.parts.len(),
                textures: self.textures.len(),
            }
        }
    }

    fn mesh(parts: &[u32], textures: &[u32], log: &Rc<RefCell<Vec<String>>>) -> FakeMesh {
        FakeMesh {
            parts: parts.to_vec(),
            textures: textures.to_vec(),
            log: log.clone(),
        }
    }

    #[test]
    fn replacing_frees_every_child_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut slot = Slot::default();

        assert_eq!(slot.replace(mesh(&[1, 2], &[7], &log)), None);
        let freed = slot.replace(mesh(&[3], &[], &log)).unwrap();
        assert_eq!(
            freed,
            Released {
                geometries: 2,
                materials: 2,
                textures: 1
            }
        );
        assert_eq!(*log.borrow(), vec!["geometry 1", "geometry 2", "texture 7"]);

        slot.clear();
        assert!(slot.is_empty());
        assert_eq!(slot.clear(), None);
        assert_eq!(
            *log.borrow(),
            vec!["geometry 1", "geometry 2", "texture 7", "geometry 3"]
        );
    }

    #[test]
    fn totals_accumulate() {
        let mut total = Released::default();
        total += Released {
            geometries: 1,
            materials: 2,
            textures: 3,
        };
        total += Released {
            geometries: 1,
            materials: 0,
            textures: 1,
        };
        assert_eq!(total.textures, 4);
        assert_eq!(total.geometries, 2);
    }
}
