//! Compute-target identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Compute target the model is placed on.
///
/// The core never touches device memory itself; the identifier is handed to
/// the model collaborator, which treats the transfer as a blocking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA accelerator by ordinal.
    Cuda(u32),
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => {
                if let Some(ordinal) = other.strip_prefix("cuda:") {
                    let ordinal = ordinal.parse::<u32>().map_err(|_| {
                        Error::Config(format!("Invalid CUDA ordinal in device '{other}'"))
                    })?;
                    Ok(Device::Cuda(ordinal))
                } else {
                    Err(Error::Config(format!(
                        "Unknown device: {other}. Supported: cpu, cuda, cuda:N"
                    )))
                }
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(n) => write!(f, "cuda:{n}"),
        }
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
    }

    #[test]
    fn test_parse_cuda_with_ordinal() {
        assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::Cuda(1));
    }

    #[test]
    fn test_parse_bare_cuda_is_ordinal_zero() {
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
    }

    #[test]
    fn test_parse_unknown_device() {
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for device in [Device::Cpu, Device::Cuda(0), Device::Cuda(3)] {
            let rendered = device.to_string();
            assert_eq!(rendered.parse::<Device>().unwrap(), device);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Device::Cuda(2)).unwrap();
        assert_eq!(json, "\"cuda:2\"");
        let back: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Device::Cuda(2));
    }
}
