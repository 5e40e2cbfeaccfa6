//! Quad geometry and the small amount of matrix math hosts need to place it.

use bytemuck::{Pod, Zeroable};

/// One vertex of the mirror quad: clip-space-ready position plus UV.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl QuadVertex {
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;
    pub const TEX_COORD_OFFSET: u32 = std::mem::offset_of!(Self, tex_coord) as u32;

    pub const fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            tex_coord,
        }
    }
}

pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Two clockwise triangles spanning [-0.5, 0.5] on x/y. V grows downwards so
/// the desktop's top row lands at the top edge.
pub static QUAD_VERTICES: [QuadVertex; QUAD_VERTEX_COUNT as usize] = [
    QuadVertex::new([-0.5, -0.5, 0.0], [0.0, 1.0]),
    QuadVertex::new([-0.5, 0.5, 0.0], [0.0, 0.0]),
    QuadVertex::new([0.5, 0.5, 0.0], [1.0, 0.0]),
    QuadVertex::new([0.5, 0.5, 0.0], [1.0, 0.0]),
    QuadVertex::new([0.5, -0.5, 0.0], [1.0, 1.0]),
    QuadVertex::new([-0.5, -0.5, 0.0], [0.0, 1.0]),
];

/// A 4x4 transform stored row by row, exactly as it is uploaded.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TransformMatrix(pub [f32; 16]);

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TransformMatrix {
    pub const ZERO: Self = Self([0.0; 16]);

    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub const BYTE_SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_slice(values: &[f32]) -> Option<Self> {
        let array: [f32; 16] = values.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    #[inline]
    pub fn at(&self, row: usize, column: usize) -> f32 {
        self.0[row * 4 + column]
    }

    /// Standard matrix product `self * rhs`.
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0f32; 16];
        for row in 0..4 {
            for column in 0..4 {
                out[row * 4 + column] = (0..4)
                    .map(|k| self.at(row, k) * rhs.at(k, column))
                    .sum();
            }
        }
        Self(out)
    }

    /// Translation-and-scale model matrix (identity rotation).
    pub fn translation_scale(translation: [f32; 3], scale: [f32; 3]) -> Self {
        let [tx, ty, tz] = translation;
        let [sx, sy, sz] = scale;
        Self([
            sx, 0.0, 0.0, tx, //
            0.0, sy, 0.0, ty, //
            0.0, 0.0, sz, tz, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Object-to-eye transform for the mirror quad: `projection *
    /// world_to_camera * model`, with the model two units in front of the
    /// origin and stretched horizontally to the captured aspect ratio.
    ///
    /// Before anything has been captured (either dimension zero) the quad is
    /// kept square.
    pub fn quad_object_to_eye(
        projection: &Self,
        world_to_camera: &Self,
        captured_width: u32,
        captured_height: u32,
    ) -> Self {
        let aspect = if captured_width == 0 || captured_height == 0 {
            1.0
        } else {
            captured_width as f32 / captured_height as f32
        };
        let model = Self::translation_scale(QUAD_MODEL_TRANSLATION, [aspect, 1.0, 1.0]);
        projection.multiply(world_to_camera).multiply(&model)
    }
}

const QUAD_MODEL_TRANSLATION: [f32; 3] = [0.0, 0.0, 2.0];

/// Host viewport rectangle in render-target pixels.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match *values {
            [x, y, width, height] => Some(Self::new(x, y, width, height)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_vertex_layout_matches_input_layout() {
        assert_eq!(QuadVertex::STRIDE, 20);
        assert_eq!(QuadVertex::TEX_COORD_OFFSET, 12);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&QUAD_VERTICES).len(), 6 * 20);
    }

    #[test]
    fn quad_covers_all_four_corners_with_matching_uvs() {
        let corners = [
            ([-0.5, 0.5], [0.0, 0.0]),
            ([0.5, 0.5], [1.0, 0.0]),
            ([0.5, -0.5], [1.0, 1.0]),
            ([-0.5, -0.5], [0.0, 1.0]),
        ];
        for (xy, uv) in corners {
            assert!(
                QUAD_VERTICES
                    .iter()
                    .any(|v| v.position[..2] == xy && v.tex_coord == uv),
                "missing corner {xy:?}"
            );
        }
        assert!(QUAD_VERTICES.iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn default_transform_is_zero() {
        assert_eq!(TransformMatrix::default(), TransformMatrix::ZERO);
    }

    #[test]
    fn transform_bytes_preserve_element_order() {
        let values: [f32; 16] = std::array::from_fn(|i| i as f32);
        let matrix = TransformMatrix(values);
        let bytes = matrix.as_bytes();
        assert_eq!(bytes.len(), TransformMatrix::BYTE_SIZE);
        assert_eq!(&bytes[4..8], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[60..64], &15.0f32.to_ne_bytes());
    }

    #[test]
    fn from_slice_requires_exactly_sixteen_values() {
        assert!(TransformMatrix::from_slice(&[0.0; 15]).is_none());
        assert_eq!(
            TransformMatrix::from_slice(&[0.0; 16]),
            Some(TransformMatrix::ZERO)
        );
        assert!(ViewportRect::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert_eq!(
            ViewportRect::from_slice(&[1.0, 2.0, 3.0, 4.0]),
            Some(ViewportRect::new(1.0, 2.0, 3.0, 4.0))
        );
    }

    #[test]
    fn identity_is_neutral_for_multiply() {
        let m = TransformMatrix(std::array::from_fn(|i| (i * 3 % 7) as f32));
        assert_eq!(m.multiply(&TransformMatrix::IDENTITY), m);
        assert_eq!(TransformMatrix::IDENTITY.multiply(&m), m);
    }

    #[test]
    fn translation_scale_places_translation_in_last_column() {
        let m = TransformMatrix::translation_scale([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        assert_eq!(m.at(0, 0), 4.0);
        assert_eq!(m.at(1, 1), 5.0);
        assert_eq!(m.at(2, 2), 6.0);
        assert_eq!(m.at(0, 3), 1.0);
        assert_eq!(m.at(1, 3), 2.0);
        assert_eq!(m.at(2, 3), 3.0);
        assert_eq!(m.at(3, 3), 1.0);
    }

    #[test]
    fn quad_object_to_eye_scales_by_captured_aspect() {
        let m = TransformMatrix::quad_object_to_eye(
            &TransformMatrix::IDENTITY,
            &TransformMatrix::IDENTITY,
            1920,
            1080,
        );
        assert!((m.at(0, 0) - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(m.at(1, 1), 1.0);
        assert_eq!(m.at(2, 3), 2.0);
    }

    #[test]
    fn quad_object_to_eye_stays_square_before_capture() {
        let m = TransformMatrix::quad_object_to_eye(
            &TransformMatrix::IDENTITY,
            &TransformMatrix::IDENTITY,
            0,
            0,
        );
        assert_eq!(m.at(0, 0), 1.0);
    }
}
