use serde::{Deserialize, Serialize};

use crate::error::{StampError, StampResult};

pub const MAX_EDGE_RANGE_MM: (f64, f64) = (1.0, 500.0);
pub const SMOOTH_RADIUS_RANGE_MM: (f64, f64) = (0.0, 10.0);
pub const HEIGHT_RANGE_MM: (f64, f64) = (0.1, 50.0);

/// Parameters handed to the converter on every render.
///
/// Treated as an immutable value: every control change builds a new
/// `Options` and the controller swaps it in whole.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub invert: bool,
    pub max_edge_mm: f64,
    pub smooth_radius_mm: f64,
    pub height_mm: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            invert: true,
            max_edge_mm: 40.0,
            smooth_radius_mm: 0.5,
            height_mm: 3.0,
        }
    }
}

impl Options {
    pub fn with_invert(self, invert: bool) -> Self {
        Self { invert, ..self }
    }

    pub fn with_max_edge_mm(self, max_edge_mm: f64) -> Self {
        Self {
            max_edge_mm,
            ..self
        }
    }

    pub fn with_smooth_radius_mm(self, smooth_radius_mm: f64) -> Self {
        Self {
            smooth_radius_mm,
            ..self
        }
    }

    pub fn with_height_mm(self, height_mm: f64) -> Self {
        Self { height_mm, ..self }
    }

    pub fn validate(&self) -> StampResult<()> {
        if !self.max_edge_mm.is_finite() || self.max_edge_mm <= 0.0 {
            return Err(StampError::invalid_options(format!(
                "max edge must be positive, got {}",
                self.max_edge_mm
            )));
        }
        if !self.smooth_radius_mm.is_finite() || self.smooth_radius_mm < 0.0 {
            return Err(StampError::invalid_options(format!(
                "smoothing radius must not be negative, got {}",
                self.smooth_radius_mm
            )));
        }
        if !self.height_mm.is_finite() || self.height_mm <= 0.0 {
            return Err(StampError::invalid_options(format!(
                "height must be positive, got {}",
                self.height_mm
            )));
        }
        Ok(())
    }

    /// Command-line flags understood by the external converter.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--invert".to_string(),
            self.invert.to_string(),
            "--max-edge-mm".to_string(),
            self.max_edge_mm.to_string(),
            "--smooth-radius-mm".to_string(),
            self.smooth_radius_mm.to_string(),
            "--height-mm".to_string(),
            self.height_mm.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_converter() {
        let opt = Options::default();
        assert!(opt.invert);
        assert_eq!(opt.max_edge_mm, 40.0);
        assert_eq!(opt.smooth_radius_mm, 0.5);
        assert_eq!(opt.height_mm, 3.0);
        assert!(opt.validate().is_ok());
    }

    #[test]
    fn with_methods_leave_original_untouched() {
        let base = Options::default();
        let changed = base.with_invert(false).with_height_mm(5.0);

        assert!(base.invert);
        assert_eq!(base.height_mm, 3.0);
        assert!(!changed.invert);
        assert_eq!(changed.height_mm, 5.0);
        assert_eq!(changed.max_edge_mm, base.max_edge_mm);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = Options::default();
        assert!(base.with_max_edge_mm(0.0).validate().is_err());
        assert!(base.with_max_edge_mm(f64::NAN).validate().is_err());
        assert!(base.with_smooth_radius_mm(-0.1).validate().is_err());
        assert!(base.with_height_mm(f64::INFINITY).validate().is_err());
        assert!(base.with_smooth_radius_mm(0.0).validate().is_ok());
    }

    #[test]
    fn args_carry_every_field() {
        let args = Options::default().with_invert(false).to_args();
        assert_eq!(
            args,
            [
                "--invert",
                "false",
                "--max-edge-mm",
                "40",
                "--smooth-radius-mm",
                "0.5",
                "--height-mm",
                "3"
            ]
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let opt: Options = serde_json::from_str(r#"{ "height_mm": 6.5 }"#).unwrap();
        assert_eq!(opt.height_mm, 6.5);
        assert!(opt.invert);
        assert_eq!(opt.max_edge_mm, 40.0);
    }
}
