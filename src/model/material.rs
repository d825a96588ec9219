use serde::{Deserialize, Serialize};

/// Surface appearance of a renderable object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default = "default_base_color")]
    pub base_color: [f32; 4],
    /// Texture path, resolved by whatever renders the object
    #[serde(default)]
    pub texture: Option<String>,
}

fn default_base_color() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: default_base_color(),
            texture: None,
        }
    }

    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default")
    }
}

/// A single-surface renderable holding exactly one material
#[derive(Debug, Clone, Default)]
pub struct MeshRenderer {
    material: Material,
}

impl MeshRenderer {
    pub fn new(material: Material) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }
}

/// Named scene object; only objects with a renderer can show a material
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub renderer: Option<MeshRenderer>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), renderer: None }
    }

    pub fn with_renderer(mut self, renderer: MeshRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn material(&self) -> Option<&Material> {
        self.renderer.as_ref().map(MeshRenderer::material)
    }
}
