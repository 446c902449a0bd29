use glam::Vec3;

/// Name given to materials synthesized when a file provides none.
pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

/// Semantic key of a material property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Name,
    ColorDiffuse,
    ColorSpecular,
    ColorAmbient,
    ColorEmissive,
    ShadingModel,
    Shininess,
    ShininessStrength,
    Opacity,
    Texture,
}

/// Role a texture plays in shading.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureType {
    None = 0,
    Diffuse = 1,
    Specular = 2,
    Ambient = 3,
    Emissive = 4,
    Height = 5,
    Normals = 6,
    Shininess = 7,
    Opacity = 8,
    Displacement = 9,
}

/// Shading model hint, numbered as stored in [`PropertyValue::Integer`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingModel {
    Flat = 1,
    Gouraud = 2,
    Phong = 3,
    Blinn = 4,
    Toon = 5,
    OrenNayar = 6,
    Minnaert = 7,
    CookTorrance = 8,
    NoShading = 9,
    Fresnel = 10,
}

impl ShadingModel {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            1 => Self::Flat,
            2 => Self::Gouraud,
            3 => Self::Phong,
            4 => Self::Blinn,
            5 => Self::Toon,
            6 => Self::OrenNayar,
            7 => Self::Minnaert,
            8 => Self::CookTorrance,
            9 => Self::NoShading,
            10 => Self::Fresnel,
            _ => return None,
        })
    }

    /// Models with a specular term, which read the shininess keys.
    pub fn is_specular(&self) -> bool {
        matches!(self, Self::Phong | Self::Blinn | Self::CookTorrance)
    }
}

/// Value of a material property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Integer(i32),
    Float(f32),
    Color(Vec3),
    Text(String),
    Texture {
        path: String,
        texture_type: TextureType,
        /// Texture-coordinate channel the texture is sampled with.
        uv_channel: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialProperty {
    pub key: MaterialKey,
    pub value: PropertyValue,
}

/// Insertion-ordered set of material properties.
///
/// Setting a key that already exists replaces its value in place. Textures are
/// keyed by their texture type, so a material holds at most one texture per type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    properties: Vec<MaterialProperty>,
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &[MaterialProperty] {
        &self.properties
    }

    pub fn set(&mut self, key: MaterialKey, value: PropertyValue) {
        let slot = self.properties.iter_mut().find(|p| {
            p.key == key
                && match (&p.value, &value) {
                    (
                        PropertyValue::Texture { texture_type: a, .. },
                        PropertyValue::Texture { texture_type: b, .. },
                    ) => a == b,
                    _ => true,
                }
        });
        match slot {
            Some(p) => p.value = value,
            None => self.properties.push(MaterialProperty { key, value }),
        }
    }

    pub fn get(&self, key: MaterialKey) -> Option<&PropertyValue> {
        self.properties.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set(MaterialKey::Name, PropertyValue::Text(name.into()));
    }

    pub fn set_color(&mut self, key: MaterialKey, color: Vec3) {
        self.set(key, PropertyValue::Color(color));
    }

    pub fn set_float(&mut self, key: MaterialKey, value: f32) {
        self.set(key, PropertyValue::Float(value));
    }

    pub fn set_shading_model(&mut self, model: ShadingModel) {
        self.set(MaterialKey::ShadingModel, PropertyValue::Integer(model as i32));
    }

    pub fn set_texture(&mut self, path: impl Into<String>, texture_type: TextureType, uv_channel: u32) {
        self.set(
            MaterialKey::Texture,
            PropertyValue::Texture { path: path.into(), texture_type, uv_channel },
        );
    }

    pub fn name(&self) -> Option<&str> {
        match self.get(MaterialKey::Name)? {
            PropertyValue::Text(name) => Some(name),
            _ => None,
        }
    }

    pub fn color(&self, key: MaterialKey) -> Option<Vec3> {
        match self.get(key)? {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn float(&self, key: MaterialKey) -> Option<f32> {
        match self.get(key)? {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Integer(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn shading_model(&self) -> Option<ShadingModel> {
        match self.get(MaterialKey::ShadingModel)? {
            PropertyValue::Integer(v) => ShadingModel::from_i32(*v),
            _ => None,
        }
    }

    /// Texture slots as `(path, type, uv_channel)` in insertion order.
    pub fn textures(&self) -> impl Iterator<Item = (&str, TextureType, u32)> {
        self.properties.iter().filter_map(|p| match &p.value {
            PropertyValue::Texture { path, texture_type, uv_channel } => {
                Some((path.as_str(), *texture_type, *uv_channel))
            }
            _ => None,
        })
    }

    pub fn texture(&self, texture_type: TextureType) -> Option<&str> {
        self.textures().find(|(_, t, _)| *t == texture_type).map(|(path, _, _)| path)
    }
}
