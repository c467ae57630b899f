mod error;
mod trails;

pub use error::TrailError;
pub use trails::{
    spawn_cleanup, LongestTrail, StoredPoint, TrailMetadata, TrailPoint, TrailStatistics,
    TrailStore,
};
