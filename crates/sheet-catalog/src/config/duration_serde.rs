//! Serde helpers for human-readable durations in configuration.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

/// `Duration` as a humantime string (`"30s"`, `"12h"`) or whole seconds
pub mod duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration_str = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&duration_str)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a duration as seconds (number) or human-readable string (e.g., '30s', '5m', '12h')",
                )
            }

            fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_secs(seconds))
            }

            fn visit_i64<E>(self, seconds: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(seconds)
                    .map(Duration::from_secs)
                    .map_err(|_| {
                        de::Error::custom(format!("Duration cannot be negative: {seconds}"))
                    })
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value)
                    .map_err(|e| de::Error::custom(format!("Invalid duration '{value}': {e}")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(with = "super::duration")]
        timeout: Duration,
    }

    #[test]
    fn test_duration_from_string_and_seconds() {
        let parsed: Holder = toml::from_str("timeout = \"1h30m\"").unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(5400));

        let parsed: Holder = toml::from_str("timeout = 45").unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(45));

        assert!(toml::from_str::<Holder>("timeout = -5").is_err());
        assert!(toml::from_str::<Holder>("timeout = \"soon\"").is_err());
    }

    #[test]
    fn test_duration_serializes_human_readable() {
        let holder = Holder {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(toml::to_string(&holder).unwrap().trim(), "timeout = \"30s\"");
    }
}
