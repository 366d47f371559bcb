//! Height-field 3D projector.
//!
//! A scan-line ordered image of palette indices (a fractal, a height map)
//! is turned into a projected surface one row at a time:
//!
//! * [`session::ProjectionSession`] owns the per-image state and is fed rows.
//! * [`project`] maps each pixel to screen and shading space (planar or
//!   spherical).
//! * [`raster`] fills triangles using nothing but a line walker.
//! * [`shade`] turns face normals into light intensities and true-colour
//!   pixels.
//! * [`scene`] writes the surface as a text scene for external ray tracers.
//! * [`targa`] writes the true-colour raster.

pub mod config;
pub mod error;
pub mod math;
pub mod project;
pub mod raster;
pub mod scene;
pub mod session;
pub mod setup;
pub mod shade;
pub mod sphere;
pub mod targa;

pub use config::{FillType, Numeric, Params3d, RayFormat, TrueColorMode};
pub use error::{Line3dError, SceneError, TargaError};
pub use raster::{Canvas, Framebuffer, Palette};
pub use session::{ProjectionSession, RenderSummary};
