use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::model::{Material, SceneObject};

/// Replaces the material on one scene object when a UI button asks for it
pub struct MaterialSwapper {
    target: Rc<RefCell<SceneObject>>,
    palette: Vec<Material>,
}

impl MaterialSwapper {
    pub fn new(target: Rc<RefCell<SceneObject>>) -> Self {
        Self { target, palette: Vec::new() }
    }

    pub fn with_palette(mut self, palette: Vec<Material>) -> Self {
        self.palette = palette;
        self
    }

    pub fn palette(&self) -> &[Material] {
        &self.palette
    }

    pub fn target(&self) -> &Rc<RefCell<SceneObject>> {
        &self.target
    }

    /// Swap in `material` if there is one and the target can render it
    pub fn update_material(&self, material: Option<&Material>) {
        debug!("Material swap requested");
        let Some(material) = material else {
            return;
        };
        let mut target = self.target.borrow_mut();
        let name = target.name.clone();
        if let Some(renderer) = target.renderer.as_mut() {
            renderer.set_material(material.clone());
            info!("'{}' now uses material '{}'", name, material.name);
        }
    }

    /// Button `index` swaps palette entry `index`; unknown buttons do nothing
    pub fn press_button(&self, index: usize) {
        self.update_material(self.palette.get(index));
    }
}
