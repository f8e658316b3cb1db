use bytemuck::Zeroable;
use glam::Vec3;

use crate::viewer::mesh::MeshObject;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 3;

/// Converts CSS-style `hsl(h, s%, l%)` into sRGB components in `0..=1`.
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let s = saturation / 100.0;
    let l = lightness / 100.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Vec3::new(r + m, g + m, b + m)
}

pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    let channel = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(color.x), channel(color.y), channel(color.z))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from `position` towards the origin.
    Directional { position: Vec3 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// sRGB colour.
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn directional(color: Vec3, intensity: f32, position: Vec3) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color,
            intensity,
        }
    }

    pub fn radiance(&self) -> Vec3 {
        srgb_to_linear(self.color) * self.intensity
    }
}

/// Lights plus at most one displayed mesh.
pub struct Scene {
    lights: Vec<Light>,
    object: Option<MeshObject>,
    revision: u64,
}

impl Scene {
    pub fn new(lights: Vec<Light>) -> Self {
        Self {
            lights,
            object: None,
            revision: 0,
        }
    }

    /// Ambient fill plus warm key, cool fill and white back lights.
    pub fn studio() -> Self {
        Self::new(vec![
            Light::ambient(Vec3::ONE, 0.25),
            Light::directional(hsl(30.0, 100.0, 75.0), 1.0, Vec3::new(-100.0, 0.0, 100.0)),
            Light::directional(hsl(240.0, 100.0, 75.0), 0.75, Vec3::new(100.0, 0.0, 100.0)),
            Light::directional(Vec3::ONE, 1.0, Vec3::new(100.0, 0.0, -100.0).normalize()),
        ])
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn object(&self) -> Option<&MeshObject> {
        self.object.as_ref()
    }

    #[cfg(test)]
    pub fn object_count(&self) -> usize {
        usize::from(self.object.is_some())
    }

    /// Bumped whenever the displayed object changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Removes the current object, then adds `object`. Returns the removed one.
    pub fn replace_object(&mut self, object: MeshObject) -> Option<MeshObject> {
        let previous = self.object.take();
        self.object = Some(object);
        self.revision += 1;
        previous
    }

    pub fn ambient(&self) -> Vec3 {
        self.lights
            .iter()
            .filter(|l| l.kind == LightKind::Ambient)
            .map(Light::radiance)
            .sum()
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub model: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub lights: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
}

impl SceneUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut lights = [DirectionalLightRaw::zeroed(); MAX_DIRECTIONAL_LIGHTS];
        let directional = scene.lights().iter().filter_map(|l| match l.kind {
            LightKind::Directional { position } => Some((position, l.radiance())),
            LightKind::Ambient => None,
        });
        for (slot, (position, radiance)) in lights.iter_mut().zip(directional) {
            *slot = DirectionalLightRaw {
                direction: position.normalize_or_zero().extend(0.0).to_array(),
                color: radiance.extend(1.0).to_array(),
            };
        }

        let model = scene
            .object()
            .map(MeshObject::model_matrix)
            .unwrap_or_default();

        Self {
            model: model.to_cols_array_2d(),
            ambient: scene.ambient().extend(1.0).to_array(),
            lights,
        }
    }
}
