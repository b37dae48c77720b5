use glam::Vec3;

/// A point in a named world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldPosition {
    pub world: String,
    pub position: Vec3,
}

impl WorldPosition {
    pub fn new(world: impl Into<String>, position: Vec3) -> Self {
        Self {
            world: world.into(),
            position,
        }
    }

    /// Euclidean distance to `other`, or `None` when the two points are not
    /// in the same world.
    pub fn distance_to(&self, other: &WorldPosition) -> Option<f32> {
        (self.world == other.world).then(|| self.position.distance(other.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_same_world() {
        let a = WorldPosition::new("overworld", Vec3::new(0.0, 64.0, 0.0));
        let b = WorldPosition::new("overworld", Vec3::new(3.0, 68.0, 0.0));
        assert_relative_eq!(a.distance_to(&b).unwrap(), 5.0);
    }

    #[test]
    fn test_distance_across_worlds_is_undefined() {
        let a = WorldPosition::new("overworld", Vec3::ZERO);
        let b = WorldPosition::new("nether", Vec3::ZERO);
        assert!(a.distance_to(&b).is_none());
    }
}
