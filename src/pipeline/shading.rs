use glam::{Vec2, Vec3};

use crate::texture::{Sampler, Texture};

use super::transform::VertexOutput;

/// Per-light shading constants. The geometric light vector arrives
/// interpolated in [`VertexOutput`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    pub color: Vec3,
    pub radius: f32,
}

/// Material inputs of the shading routine.
///
/// The optional textures double as capability flags: a color texture switches
/// the base color source, a normal map switches the normal source. The same
/// routine covers every combination.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMaterial<'a> {
    pub base_color: Vec3,
    /// Specular exponent.
    pub shininess: f32,
    pub color_texture: Option<&'a Texture>,
    pub normal_map: Option<&'a Texture>,
    pub sampler: Sampler,
}

impl SurfaceMaterial<'_> {
    /// Flat-colored, untextured material.
    pub fn flat(base_color: Vec3, shininess: f32) -> Self {
        Self {
            base_color,
            shininess,
            color_texture: None,
            normal_map: None,
            sampler: Sampler::repeating(),
        }
    }

    fn base(&self, uv: Vec2) -> Vec3 {
        match self.color_texture {
            Some(texture) => texture.sample(uv, &self.sampler).truncate() * self.base_color,
            None => self.base_color,
        }
    }

    fn surface_normal(&self, fragment: &VertexOutput) -> Vec3 {
        match self.normal_map {
            Some(map) => map.sample_normal(fragment.uv, &self.sampler),
            None => fragment.normal.normalize_or_zero(),
        }
    }
}

/// Radius-normalized quadratic falloff: `max(0, 1 - |L/r|^2)`.
///
/// Reaches exactly zero at the light radius, so the distance cull in
/// [`shade_fragment`] introduces no discontinuity.
pub fn radius_attenuation(light_vec: Vec3, radius: f32) -> f32 {
    let scaled = light_vec / radius;
    (1.0 - scaled.dot(scaled)).max(0.0)
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// The fragment shading stage: accumulated point-light reflectance.
///
/// Per light: Lambertian diffuse, a specular lobe gated on a positive
/// Lambertian term, and radius attenuation with an early skip for lights
/// farther than their radius. A fragment sitting exactly on a light gets
/// attenuation 1 and a zero light direction; the guarded normalize keeps the
/// output finite. Output is linear color, no tone mapping.
pub fn shade_fragment(
    fragment: &VertexOutput,
    lights: &[LightParams],
    material: &SurfaceMaterial<'_>,
) -> Vec3 {
    #[cfg(feature = "validation")]
    validate_fragment(fragment);

    let base = material.base(fragment.uv);
    let normal = material.surface_normal(fragment);
    let view = fragment.eye_dir.normalize_or_zero();

    let mut color = Vec3::ZERO;
    for (light, light_vec) in lights.iter().zip(fragment.light_dirs) {
        // Distance cull.
        if light_vec.length_squared() > light.radius * light.radius {
            continue;
        }
        let attenuation = radius_attenuation(light_vec, light.radius);
        let light_dir = light_vec.normalize_or_zero();
        let lambert = normal.dot(light_dir).max(0.0);
        if lambert <= 0.0 {
            continue;
        }
        let reflected = reflect(-light_dir, normal);
        let specular = reflected.dot(view).max(0.0).powf(material.shininess);
        color += (base * lambert + Vec3::splat(specular)) * light.color * attenuation;
    }
    color
}

#[cfg(feature = "validation")]
fn validate_fragment(fragment: &VertexOutput) {
    if !fragment.eye_dir.is_finite() || !fragment.normal.is_finite() {
        log::warn!(
            "non-finite interpolated fragment inputs: eye {:?}, normal {:?}",
            fragment.eye_dir,
            fragment.normal
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use glam::Vec4;

    fn fragment(eye: Vec3, light: Vec3, normal: Vec3) -> VertexOutput {
        let mut out = VertexOutput {
            eye_dir: eye,
            normal,
            ..VertexOutput::default()
        };
        out.light_dirs[0] = light;
        out
    }

    fn white_light(radius: f32) -> LightParams {
        LightParams {
            color: Vec3::ONE,
            radius,
        }
    }

    #[test]
    fn attenuation_is_one_at_light_position() {
        assert_eq!(radius_attenuation(Vec3::ZERO, 10.0), 1.0);
    }

    #[test]
    fn attenuation_reaches_zero_at_radius() {
        let att = radius_attenuation(Vec3::new(10.0, 0.0, 0.0), 10.0);
        assert!(att.abs() < 1e-6);
    }

    #[test]
    fn fragment_on_light_stays_finite() {
        let frag = fragment(Vec3::Z, Vec3::ZERO, Vec3::Z);
        let color = shade_fragment(
            &frag,
            &[white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        assert!(color.is_finite());
    }

    #[test]
    fn light_beyond_radius_contributes_nothing() {
        let frag = fragment(Vec3::Z, Vec3::new(0.0, 0.0, 11.0), Vec3::Z);
        let color = shade_fragment(
            &frag,
            &[white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn head_on_light_gives_full_lambert() {
        let frag = fragment(Vec3::Z, Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let light = white_light(10.0);
        let color = shade_fragment(&frag, &[light], &SurfaceMaterial::flat(Vec3::ONE, 50.0));
        let expected_attenuation = radius_attenuation(frag.light_dirs[0], light.radius);
        // Diffuse 1.0 plus the mirror-aligned specular lobe, attenuated.
        assert!((color.x - 2.0 * expected_attenuation).abs() < 1e-5);
    }

    #[test]
    fn no_specular_without_lambert() {
        // Light behind the surface, eye placed on the mirror direction.
        let frag = fragment(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let color = shade_fragment(
            &frag,
            &[white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 1.0),
        );
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn grazing_light_dims_diffuse() {
        let head_on = shade_fragment(
            &fragment(Vec3::Z, Vec3::new(0.0, 0.0, 5.0), Vec3::Z),
            &[white_light(100.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        let grazing = shade_fragment(
            &fragment(Vec3::Z, Vec3::new(4.9, 0.0, 0.5), Vec3::Z),
            &[white_light(100.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        assert!(grazing.x < head_on.x);
    }

    #[test]
    fn color_texture_modulates_base() {
        let red = Texture::solid(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let material = SurfaceMaterial {
            color_texture: Some(&red),
            ..SurfaceMaterial::flat(Vec3::ONE, 50.0)
        };
        let frag = fragment(Vec3::Z, Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let color = shade_fragment(&frag, &[white_light(10.0)], &material);
        assert!(color.x > 0.0);
        // Green/blue keep only the specular lobe.
        assert!(color.y < color.x);
        assert_eq!(color.y, color.z);
    }

    #[test]
    fn normal_map_redirects_the_normal() {
        // Texel encoding +X after the green flip and remap.
        let map = Texture::from_rgba8(1, 1, vec![255, 128, 128, 255]).unwrap();
        let material = SurfaceMaterial {
            normal_map: Some(&map),
            ..SurfaceMaterial::flat(Vec3::ONE, 50.0)
        };
        // Light along +X: aligned with the mapped normal, orthogonal to the
        // interpolated one.
        let frag = fragment(Vec3::Z, Vec3::new(5.0, 0.0, 0.0), Vec3::Z);
        let mapped = shade_fragment(&frag, &[white_light(10.0)], &material);
        let unmapped = shade_fragment(
            &frag,
            &[white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        assert!(mapped.x > 0.5);
        assert_eq!(unmapped, Vec3::ZERO);
    }

    #[test]
    fn lights_accumulate() {
        let mut frag = fragment(Vec3::Z, Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        frag.light_dirs[1] = Vec3::new(0.0, 0.0, 5.0);
        let one = shade_fragment(
            &frag,
            &[white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        let two = shade_fragment(
            &frag,
            &[white_light(10.0), white_light(10.0)],
            &SurfaceMaterial::flat(Vec3::ONE, 50.0),
        );
        assert!((two - one * 2.0).length() < 1e-5);
    }
}
