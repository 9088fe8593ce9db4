//! Generation options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Rejected option override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("option '{field}' must be a non-negative number")]
    NotANumber { field: &'static str },

    #[error("option '{field}' must be a non-negative integer")]
    NotAnInteger { field: &'static str },

    #[error("options must be a JSON object")]
    NotAnObject,
}

/// Options forwarded to the generation provider.
///
/// Recognized fields are typed; anything else lands in `extra` and is passed
/// through to the provider untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Clip length in seconds
    pub duration_seconds: f64,
    /// Frames per second
    pub fps: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Diffusion steps
    pub steps: u32,
    /// Number of samples to generate
    pub num_samples: u32,
    /// Unrecognized options, passed through opaquely
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Default for GenerationOptions {
    /// Fast defaults, tuned for short low-latency previews.
    fn default() -> Self {
        let mut extra = Map::new();
        extra.insert("guidance_scale".to_string(), Value::from(6));

        Self {
            duration_seconds: 5.0,
            fps: 12,
            width: 512,
            height: 288,
            steps: 20,
            num_samples: 1,
            extra,
        }
    }
}

impl GenerationOptions {
    /// Merge user overrides over the defaults.
    pub fn from_overrides(overrides: &Map<String, Value>) -> Result<Self, OptionsError> {
        let mut options = Self::default();
        options.apply_overrides(overrides)?;
        Ok(options)
    }

    /// Merge a JSON value of user overrides (`null` means no overrides).
    pub fn from_json(value: &Value) -> Result<Self, OptionsError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::from_overrides(map),
            _ => Err(OptionsError::NotAnObject),
        }
    }

    /// Apply overrides in place, last writer wins per field.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> Result<(), OptionsError> {
        for (key, value) in overrides {
            match key.as_str() {
                "duration" | "duration_seconds" => {
                    self.duration_seconds = as_non_negative_f64(value, "duration_seconds")?;
                }
                "fps" => self.fps = as_u32(value, "fps")?,
                "width" => self.width = as_u32(value, "width")?,
                "height" => self.height = as_u32(value, "height")?,
                "steps" => self.steps = as_u32(value, "steps")?,
                "samples" | "num_samples" => self.num_samples = as_u32(value, "num_samples")?,
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Build the provider input payload for a prompt.
    pub fn to_provider_input(&self, prompt: &str) -> Map<String, Value> {
        let mut input = self.extra.clone();
        input.insert("duration".to_string(), duration_value(self.duration_seconds));
        input.insert("fps".to_string(), Value::from(self.fps));
        input.insert("width".to_string(), Value::from(self.width));
        input.insert("height".to_string(), Value::from(self.height));
        input.insert("steps".to_string(), Value::from(self.steps));
        input.insert("samples".to_string(), Value::from(self.num_samples));
        input.insert("prompt".to_string(), Value::from(prompt));
        input
    }
}

/// Whole-second durations go over the wire as integers.
fn duration_value(seconds: f64) -> Value {
    if seconds.fract() == 0.0 && seconds <= u32::MAX as f64 {
        Value::from(seconds as u64)
    } else {
        Value::from(seconds)
    }
}

fn as_non_negative_f64(value: &Value, field: &'static str) -> Result<f64, OptionsError> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or(OptionsError::NotANumber { field })
}

fn as_u32(value: &Value, field: &'static str) -> Result<u32, OptionsError> {
    if let Some(v) = value.as_u64() {
        return u32::try_from(v).map_err(|_| OptionsError::NotAnInteger { field });
    }
    // Accept integral floats such as 12.0
    match value.as_f64() {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(OptionsError::NotAnInteger { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = GenerationOptions::default();
        assert_eq!(options.duration_seconds, 5.0);
        assert_eq!(options.fps, 12);
        assert_eq!((options.width, options.height), (512, 288));
        assert_eq!(options.steps, 20);
        assert_eq!(options.num_samples, 1);
        assert_eq!(options.extra.get("guidance_scale"), Some(&json!(6)));
    }

    #[test]
    fn test_overrides_win_per_field() {
        let overrides = json!({"fps": 24, "duration": 8, "samples": 2});
        let options = GenerationOptions::from_json(&overrides).unwrap();
        assert_eq!(options.fps, 24);
        assert_eq!(options.duration_seconds, 8.0);
        assert_eq!(options.num_samples, 2);
        // Untouched fields keep their defaults
        assert_eq!(options.width, 512);
    }

    #[test]
    fn test_unrecognized_fields_pass_through() {
        let overrides = json!({"seed": "abc", "guidance_scale": 9, "nested": {"a": [1, 2]}});
        let options = GenerationOptions::from_json(&overrides).unwrap();
        assert_eq!(options.extra.get("seed"), Some(&json!("abc")));
        assert_eq!(options.extra.get("guidance_scale"), Some(&json!(9)));
        assert_eq!(options.extra.get("nested"), Some(&json!({"a": [1, 2]})));
    }

    #[test]
    fn test_rejects_bad_recognized_values() {
        assert_eq!(
            GenerationOptions::from_json(&json!({"fps": "fast"})),
            Err(OptionsError::NotAnInteger { field: "fps" })
        );
        assert_eq!(
            GenerationOptions::from_json(&json!({"width": 10.5})),
            Err(OptionsError::NotAnInteger { field: "width" })
        );
        assert_eq!(
            GenerationOptions::from_json(&json!({"duration": -1})),
            Err(OptionsError::NotANumber { field: "duration_seconds" })
        );
        assert_eq!(
            GenerationOptions::from_json(&json!([1, 2])),
            Err(OptionsError::NotAnObject)
        );
    }

    #[test]
    fn test_null_means_defaults() {
        let options = GenerationOptions::from_json(&Value::Null).unwrap();
        assert_eq!(options, GenerationOptions::default());
    }

    #[test]
    fn test_provider_input_wire_names() {
        let mut options = GenerationOptions::default();
        options.fps = 24;
        let input = options.to_provider_input("a calm forest");
        assert_eq!(input.get("prompt"), Some(&json!("a calm forest")));
        assert_eq!(input.get("duration"), Some(&json!(5)));
        assert_eq!(input.get("fps"), Some(&json!(24)));
        assert_eq!(input.get("samples"), Some(&json!(1)));
        assert_eq!(input.get("guidance_scale"), Some(&json!(6)));
        assert!(input.get("num_samples").is_none());
    }

    #[test]
    fn test_fractional_duration_kept() {
        let options = GenerationOptions::from_json(&json!({"duration_seconds": 2.5})).unwrap();
        let input = options.to_provider_input("x");
        assert_eq!(input.get("duration"), Some(&json!(2.5)));
    }
}
