//! Render metadata snapshot reported by the host application.
//!
//! [`RenderInfo`] is what the render context provider hands to the tracker
//! when a completion notification is composed. Sample counts are only
//! meaningful for path-tracing engines, so they are reported for
//! [`ENGINE_CYCLES`] and shown as [`NOT_APPLICABLE`] otherwise.

use serde::{Deserialize, Serialize};

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// Engine identifier of the path tracer that reports a sample count.
pub const ENGINE_CYCLES: &str = "CYCLES";

/// Placeholder shown for values that are absent or do not apply.
pub const NOT_APPLICABLE: &str = "N/A";

/* --------------------------------------------------------------------------
RenderInfo
-------------------------------------------------------------------------- */

/// Render settings and progress at the moment a notification is composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderInfo {
    pub resolution_x: u32,
    pub resolution_y: u32,
    /// Engine identifier as reported by the host, e.g. `"CYCLES"`.
    pub engine: String,
    /// Configured sample count; hosts may omit it for engines without one.
    #[serde(default)]
    pub samples: Option<u32>,
    pub frame_start: i32,
    pub frame_end: i32,
    pub frame_current: i32,
}

impl RenderInfo {
    /// Output resolution formatted as `WIDTHxHEIGHT`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.resolution_x, self.resolution_y)
    }

    /// Sample count label, or `N/A` when the engine has no sample setting.
    pub fn samples_label(&self) -> String {
        match self.samples {
            Some(samples) if self.engine == ENGINE_CYCLES => samples.to_string(),
            _ => NOT_APPLICABLE.to_string(),
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn cycles_info() -> RenderInfo {
        RenderInfo {
            resolution_x: 1920,
            resolution_y: 1080,
            engine: ENGINE_CYCLES.to_string(),
            samples: Some(128),
            frame_start: 1,
            frame_end: 250,
            frame_current: 1,
        }
    }

    #[test]
    fn resolution_is_width_by_height() {
        assert_eq!(cycles_info().resolution(), "1920x1080");
    }

    #[test]
    fn cycles_reports_samples() {
        assert_eq!(cycles_info().samples_label(), "128");
    }

    #[test]
    fn other_engines_report_not_applicable() {
        let info = RenderInfo {
            engine: "BLENDER_EEVEE_NEXT".to_string(),
            ..cycles_info()
        };
        assert_eq!(info.samples_label(), NOT_APPLICABLE);
    }

    #[test]
    fn cycles_without_samples_reports_not_applicable() {
        let info = RenderInfo {
            samples: None,
            ..cycles_info()
        };
        assert_eq!(info.samples_label(), NOT_APPLICABLE);
    }

    #[test]
    fn samples_default_to_none_when_omitted() {
        let info: RenderInfo = serde_json::from_str(
            r#"{"resolution_x":640,"resolution_y":480,"engine":"BLENDER_WORKBENCH",
                "frame_start":1,"frame_end":1,"frame_current":1}"#,
        )
        .expect("valid render info");
        assert!(info.samples.is_none());
        assert_eq!(info.resolution(), "640x480");
    }
}
