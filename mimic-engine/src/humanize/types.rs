use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Reserved character a replaying caller must turn into a backspace key press.
pub const BACKSPACE: char = '\u{8}';

/// A 2D screen coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = String;

    /// Parses `"x,y"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (x, y) = raw
            .split_once(',')
            .ok_or_else(|| format!("expected 'x,y', got '{raw}'"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid coordinate '{}': {e}", part.trim()))
        };
        Ok(Self::new(parse(x)?, parse(y)?))
    }
}

/// One step of a typing sequence. The delay is how long to wait after the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyAction {
    Key {
        character: char,
        #[serde(rename = "delay_ms", with = "duration_ms")]
        delay: Duration,
    },
    Pause {
        #[serde(rename = "delay_ms", with = "duration_ms")]
        delay: Duration,
    },
}

impl KeyAction {
    pub fn delay(&self) -> Duration {
        match self {
            Self::Key { delay, .. } | Self::Pause { delay } => *delay,
        }
    }

    /// The character to press, if this is a key action.
    pub fn character(&self) -> Option<char> {
        match self {
            Self::Key { character, .. } => Some(*character),
            Self::Pause { .. } => None,
        }
    }

    pub fn is_backspace(&self) -> bool {
        self.character() == Some(BACKSPACE)
    }
}

/// One scroll tick. Zero distance with a delay is a pause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollAction {
    pub distance: i32,
    #[serde(rename = "delay_ms", with = "duration_ms")]
    pub delay: Duration,
}

impl ScrollAction {
    pub fn is_pause(&self) -> bool {
        self.distance == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Down the page.
    Forward,
    /// Up the page.
    Backward,
}

impl ScrollDirection {
    pub fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" | "down" => Ok(Self::Forward),
            "backward" | "up" => Ok(Self::Backward),
            other => Err(format!(
                "unknown scroll direction '{other}' (expected forward/down or backward/up)"
            )),
        }
    }
}

/// Durations as fractional milliseconds on the wire.
pub(crate) mod duration_ms {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(D::Error::custom(format!("invalid delay: {ms}ms")));
        }
        Duration::try_from_secs_f64(ms / 1000.0).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_parses_from_pair() {
        assert_eq!("10, 20.5".parse::<Point>(), Ok(Point::new(10.0, 20.5)));
        assert!("10".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }

    #[test]
    fn direction_aliases() {
        assert_eq!("Down".parse(), Ok(ScrollDirection::Forward));
        assert_eq!("up".parse(), Ok(ScrollDirection::Backward));
        assert!("sideways".parse::<ScrollDirection>().is_err());
        assert_eq!(ScrollDirection::Backward.sign(), -1);
    }

    #[test]
    fn key_action_serializes_with_kind_tag() {
        let action = KeyAction::Key {
            character: 'a',
            delay: Duration::from_micros(12_500),
        };
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json["kind"], "key");
        assert_eq!(json["character"], "a");
        assert!((json["delay_ms"].as_f64().unwrap() - 12.5).abs() < 1e-9);

        let pause: KeyAction =
            serde_json::from_str(r#"{"kind":"pause","delay_ms":150.25}"#).unwrap();
        assert_eq!(pause.character(), None);
        assert!(serde_json::from_str::<KeyAction>(r#"{"kind":"pause","delay_ms":-1}"#).is_err());
    }

    #[test]
    fn backspace_detection() {
        let bs = KeyAction::Key {
            character: BACKSPACE,
            delay: Duration::ZERO,
        };
        assert!(bs.is_backspace());
        assert!(!KeyAction::Pause {
            delay: Duration::ZERO
        }
        .is_backspace());
    }
}
