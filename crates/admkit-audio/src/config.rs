use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// Largest accepted look-behind or look-ahead margin.
pub const MAX_MARGIN_SECONDS: f64 = 60.0;

/// Margins added around a request when the cache window is refilled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub look_behind_seconds: f64,
    pub look_ahead_seconds: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            look_behind_seconds: 0.2,
            look_ahead_seconds: 1.0,
        }
    }
}

impl CacheConfig {
    /// Rejects margins that are negative, not finite, or longer than
    /// [`MAX_MARGIN_SECONDS`].
    pub fn validate(&self) -> Result<()> {
        let margins = [
            ("look_behind_seconds", self.look_behind_seconds),
            ("look_ahead_seconds", self.look_ahead_seconds),
        ];
        for (field, seconds) in margins {
            if !(0.0..=MAX_MARGIN_SECONDS).contains(&seconds) {
                return Err(AudioError::InvalidMargin { field, seconds });
            }
        }
        Ok(())
    }

    pub fn look_behind_frames(&self, sample_rate: u32) -> i64 {
        seconds_to_frames(self.look_behind_seconds, sample_rate)
    }

    pub fn look_ahead_frames(&self, sample_rate: u32) -> i64 {
        seconds_to_frames(self.look_ahead_seconds, sample_rate)
    }
}

fn seconds_to_frames(seconds: f64, sample_rate: u32) -> i64 {
    (seconds.max(0.0) * f64::from(sample_rate)).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margins_round_up_to_whole_frames() {
        let config = CacheConfig::default();
        assert_eq!(config.look_behind_frames(48_000), 9_600);
        assert_eq!(config.look_ahead_frames(48_000), 48_000);
        assert_eq!(config.look_behind_frames(44_100), 8_820);

        let odd = CacheConfig {
            look_behind_seconds: 0.5,
            look_ahead_seconds: 0.0001,
        };
        assert_eq!(odd.look_behind_frames(11_025), 5_513);
        assert_eq!(odd.look_ahead_frames(11_025), 2);
    }

    #[test]
    fn out_of_range_margins_are_rejected() {
        assert!(CacheConfig::default().validate().is_ok());
        for seconds in [1e30, -0.5, f64::NAN, f64::INFINITY, MAX_MARGIN_SECONDS + 1.0] {
            let config = CacheConfig {
                look_behind_seconds: seconds,
                ..CacheConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(AudioError::InvalidMargin {
                    field: "look_behind_seconds",
                    ..
                })
            ));
        }
        let edge = CacheConfig {
            look_behind_seconds: 0.0,
            look_ahead_seconds: MAX_MARGIN_SECONDS,
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"look_ahead_seconds": 2.0}"#).unwrap();
        assert_eq!(config.look_behind_seconds, 0.2);
        assert_eq!(config.look_ahead_seconds, 2.0);
    }
}
