mod collection;
mod feature;
mod geometry;
mod properties;
mod value;

pub use collection::GeoCollection;
pub use feature::GeoFeature;
pub use geometry::{Coordinates1, Coordinates2, Coordinates3, Geometry, Point};
pub use properties::GeoProperties;
pub use value::GeoValue;
