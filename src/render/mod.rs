//! Presentation of evaluation results: CDF charts and map overlays.

mod backend;
pub mod chart;
pub mod map;

pub use chart::{render_cdf_chart, render_timeline_chart, ChartKind, ChartOptions};
pub use map::{
    evaluation_overlay, timeline_overlay, write_geojson, write_leaflet_html, MapOverlay,
};
