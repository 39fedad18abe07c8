mod basemap;
mod geometry;
mod projection;
mod renderer;
mod view;

pub use basemap::{BUILTIN_ATTRIBUTION, NATURAL_EARTH_ATTRIBUTION};
pub use projection::Viewport;
pub use renderer::{Lod, MapLayers, MapRenderer};
pub use view::{CircleMarker, MapView, MarkerPolicy, MarkerStyle};
