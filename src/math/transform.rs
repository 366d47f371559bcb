//! 4×4 affine transforms and the pinhole perspective divide.
//!
//! Points are *row* vectors multiplied from the left (`v·M`), and every
//! builder call composes its operation after the ones already in the matrix:
//! `Transform::IDENTITY.translate(t).scale(s)` first translates, then scales.
//! Internally the matrix is stored as glam's column-major `DMat4`, which is
//! the transpose of the row-vector matrix, so composition is a pre-multiply.

use glam::{DMat4, DVec3};

use super::BAD_VEC;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform(DMat4);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Transform(DMat4::IDENTITY);

    #[inline]
    fn then(self, op: DMat4) -> Self {
        Transform(op * self.0)
    }

    pub fn scale(self, sx: f64, sy: f64, sz: f64) -> Self {
        self.then(DMat4::from_scale(DVec3::new(sx, sy, sz)))
    }

    /// Rotate about the x axis; positive angles turn +y towards −z.
    pub fn rotate_x(self, rad: f64) -> Self {
        self.then(DMat4::from_rotation_x(-rad))
    }

    /// Rotate about the y axis; positive angles turn +z towards −x.
    pub fn rotate_y(self, rad: f64) -> Self {
        self.then(DMat4::from_rotation_y(-rad))
    }

    /// Rotate about the z axis; positive angles turn +x towards −y.
    pub fn rotate_z(self, rad: f64) -> Self {
        self.then(DMat4::from_rotation_z(-rad))
    }

    pub fn translate(self, dx: f64, dy: f64, dz: f64) -> Self {
        self.then(DMat4::from_translation(DVec3::new(dx, dy, dz)))
    }

    /// `v·M`, translation included.
    #[inline]
    pub fn apply(&self, v: DVec3) -> DVec3 {
        self.0.transform_point3(v)
    }

    /// `M·v` over the upper 3×3 block (column-vector order, no translation).
    ///
    /// For a rotation with uniform scale `s` this undoes [`apply`](Self::apply)
    /// up to a factor of `s²`.
    #[inline]
    pub fn apply_transposed(&self, v: DVec3) -> DVec3 {
        self.0.transpose().transform_vector3(v)
    }

    /// Element `[row][col]` in row-vector layout (row 3 holds the translation).
    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.0.col(row)[col]
    }
}

/// Eye position for the perspective divide; `z == 0` means orthographic.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct View(pub DVec3);

impl View {
    #[inline]
    pub fn is_perspective(&self) -> bool {
        self.0.z != 0.0
    }

    /// Pinhole projection towards the eye. `None` when `v` is level with or
    /// behind the eye.
    ///
    /// Only x and y are projected; z is returned untouched.
    pub fn project(&self, v: DVec3) -> Option<DVec3> {
        let eye = self.0;
        let denom = eye.z - v.z;
        if denom >= 0.0 {
            return None;
        }
        Some(DVec3::new(
            (v.x * eye.z - eye.x * v.z) / denom,
            (v.y * eye.z - eye.y * v.z) / denom,
            v.z,
        ))
    }

    /// Like [`project`](Self::project) but yields the bad-point sentinel
    /// for points behind the eye, which the clipping code later rejects.
    #[inline]
    pub fn project_or_bad(&self, v: DVec3) -> DVec3 {
        self.project(v).unwrap_or(BAD_VEC)
    }
}
