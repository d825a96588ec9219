// CONTROLLER: Input, camera logic, and update loop
pub mod bindings;
pub mod camera_controller;
pub mod frame_loop;
pub mod input;
pub mod material_swapper;

pub use bindings::{ActionMapConfig, ActionPhase, ActionValue, InputBindingTable, PlayerActions};
pub use camera_controller::CameraOrientationController;
pub use frame_loop::{FrameContext, ViewerLoop};
pub use input::{InputEvent, InputSource, InputState};
pub use material_swapper::MaterialSwapper;
