use glam::{Quat, Vec3};

/// Time-stamped vector key (translation or scaling).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorKey {
    pub time: f64,
    pub value: Vec3,
}

/// Time-stamped rotation key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuatKey {
    pub time: f64,
    pub value: Quat,
}

/// Keyframe tracks animating a single node, addressed by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAnim {
    pub node_name: String,
    pub position_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub scaling_keys: Vec<VectorKey>,
}

impl NodeAnim {
    pub fn is_empty(&self) -> bool {
        self.position_keys.is_empty() && self.rotation_keys.is_empty() && self.scaling_keys.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Duration in ticks. Negative while unknown; the preprocessor infers it.
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: Vec<NodeAnim>,
}

impl Default for Animation {
    fn default() -> Self {
        Self { name: String::new(), duration: -1.0, ticks_per_second: 0.0, channels: Vec::new() }
    }
}

impl Animation {
    pub fn has_duration(&self) -> bool {
        self.duration >= 0.0
    }
}
