pub mod classifier;

pub use classifier::{classify, BoundingBox, CameraAngle};
