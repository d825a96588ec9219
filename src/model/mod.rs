// MODEL: Viewer state and data
pub mod camera;
pub mod material;
pub mod orientation;

pub use camera::Camera;
pub use material::{Material, MeshRenderer, SceneObject};
pub use orientation::{Orientation, Space};
