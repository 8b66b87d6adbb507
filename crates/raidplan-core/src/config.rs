//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for an editing session. Distances are in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Minimum pointer travel before a freehand point is recorded.
    pub min_draw_distance: f64,
    /// Pointer slop when hit-testing shapes.
    pub hit_tolerance: f64,
    /// Radius around transform handles that still grabs them.
    pub handle_tolerance: f64,
    /// A rubber band smaller than this on both axes counts as a click.
    pub click_threshold: f64,
    /// Default stroke color of new freehand paths.
    pub stroke_color: String,
    /// Default stroke width of new freehand paths.
    pub stroke_width: f64,
    /// Offset applied to pasted shapes on both axes.
    pub paste_offset: f64,
    /// Step that rotation snaps to while snapping is requested, in degrees.
    pub rotation_snap_degrees: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_draw_distance: 2.0,
            hit_tolerance: 4.0,
            handle_tolerance: 8.0,
            click_threshold: 3.0,
            stroke_color: "white".to_string(),
            stroke_width: 2.0,
            paste_offset: 20.0,
            rotation_snap_degrees: 15.0,
        }
    }
}
