//! Wall geometry update between coupling iterations.
//!
//! New wall heights are denoised with a cubic smoothing spline and
//! evaluated at the control points of the mesh-generator script, which is
//! then rewritten in place.

pub mod error;
pub mod geo;
pub mod options;
pub mod spline;

pub use error::{GeometryError, GeometryResult};
pub use geo::{
    ChannelGeo, GeoPoint, MeshDivisions, parse_points, update_geo_file, update_point_heights,
    write_channel_geo,
};
pub use options::{Extrapolation, GeometryOptions};
pub use spline::{SmoothingSpline, smooth_onto, smoothing_target};
