use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::scene::SceneObject;

/// Thread-safe container mirroring the mutable state of the scene graph.
///
/// The frame loop advances animations through it while renders work from
/// snapshots.
#[derive(Debug, Default)]
pub struct DataModel {
    objects: Arc<RwLock<Vec<SceneObject>>>,
}

impl Clone for DataModel {
    fn clone(&self) -> Self {
        Self {
            objects: Arc::clone(&self.objects),
        }
    }
}

impl DataModel {
    /// Creates an empty data model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a data model from an initial set of objects.
    pub fn from_objects(objects: Vec<SceneObject>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(objects)),
        }
    }

    /// Replaces the stored objects with a new snapshot.
    pub fn replace_objects(&self, objects: Vec<SceneObject>) {
        *self.objects.write() = objects;
    }

    /// Returns a snapshot of all stored objects.
    pub fn all_objects(&self) -> Vec<SceneObject> {
        self.objects.read().clone()
    }

    /// Returns a clone of the requested object.
    pub fn get(&self, name: &str) -> Option<SceneObject> {
        self.objects
            .read()
            .iter()
            .find(|object| object.name == name)
            .cloned()
    }

    /// Applies a mutation to the requested object.
    pub fn update<F, R>(&self, name: &str, mut updater: F) -> Option<R>
    where
        F: FnMut(&mut SceneObject) -> R,
    {
        let mut guard = self.objects.write();
        let object = guard.iter_mut().find(|object| object.name == name)?;
        Some(updater(object))
    }

    pub fn set_position(&self, name: &str, position: Vec3) -> bool {
        self.update(name, |obj| obj.position = position).is_some()
    }

    /// Advances every object's animation by one step.
    pub fn advance_animations(&self) {
        for object in self.objects.write().iter_mut() {
            object.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_object(name: &str) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            ..SceneObject::default()
        }
    }

    #[test]
    fn replace_and_get_object() {
        let model = DataModel::from_objects(vec![make_object("Crate")]);
        assert!(model.get("Crate").is_some());
        model.replace_objects(vec![make_object("Sphere")]);
        assert!(model.get("Crate").is_none());
        assert!(model.get("Sphere").is_some());
    }

    #[test]
    fn update_modifies_object() {
        let model = DataModel::from_objects(vec![make_object("Crate")]);
        model.set_position("Crate", Vec3::splat(2.0));
        let object = model.get("Crate").unwrap();
        assert_eq!(object.position, Vec3::splat(2.0));
    }

    #[test]
    fn update_returns_false_for_missing_object() {
        let model = DataModel::new();
        assert!(!model.set_position("Unknown", Vec3::ONE));
    }

    #[test]
    fn advance_animations_spins_objects() {
        let mut spinning = make_object("Spinner");
        spinning.spin = Vec3::new(0.0, 1.0, 0.0);
        let model = DataModel::from_objects(vec![spinning]);
        model.advance_animations();
        model.advance_animations();
        let object = model.get("Spinner").unwrap();
        assert!((object.rotation.y - 2.0).abs() < 1e-6);
    }
}
