//! Output device enumeration and selection using CPAL.

use std::fmt;
use std::str::FromStr;

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use serde::{Deserialize, Serialize};

use crate::error::{RemoteAudioError, RemoteAudioResult};

/// Which output device to open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceSelector {
    /// The host's default output device.
    #[default]
    Default,
    /// Position in the host's output device list.
    Index(usize),
    /// First device whose name contains this text, ignoring case.
    Name(String),
}

impl FromStr for DeviceSelector {
    type Err = std::convert::Infallible;

    /// `"default"` (or an empty string), a numeric index, or a name fragment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("default") {
            Ok(Self::Default)
        } else if let Ok(index) = s.parse() {
            Ok(Self::Index(index))
        } else {
            Ok(Self::Name(s.to_string()))
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default output device"),
            Self::Index(index) => write!(f, "output device #{index}"),
            Self::Name(name) => write!(f, "output device matching '{name}'"),
        }
    }
}

/// Whether `device_name` matches the name fragment `query`.
pub fn name_matches(device_name: &str, query: &str) -> bool {
    device_name.to_lowercase().contains(&query.to_lowercase())
}

/// Summary of one output device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Position in the host's output device list
    pub index: usize,
    /// Name reported by the host
    pub name: String,
    /// Whether this is the host's default output
    pub is_default: bool,
    /// Channel count of the default output config, if it could be queried
    pub channels: Option<u16>,
    /// Sample rate of the default output config, if it could be queried
    pub sample_rate: Option<u32>,
}

/// Entry point to a host's output devices.
///
/// Devices are looked up on demand rather than cached, so hot-plugged
/// devices show up on the next call.
pub struct DeviceManager {
    host: Host,
}

impl DeviceManager {
    /// Use the platform's default host.
    pub fn new() -> Self {
        Self::with_host(cpal::default_host())
    }

    /// Use a specific host.
    pub fn with_host(host: Host) -> Self {
        Self { host }
    }

    /// Name of the underlying host API.
    pub fn host_name(&self) -> &'static str {
        self.host.id().name()
    }

    /// The underlying CPAL host.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// List every output device.
    ///
    /// Devices whose name cannot be read are skipped with a warning.
    pub fn output_devices(&self) -> RemoteAudioResult<Vec<DeviceInfo>> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|device| device.name().ok());

        let mut devices = Vec::new();
        for (index, device) in self.host.output_devices()?.enumerate() {
            let name = match device.name() {
                Ok(name) => name,
                Err(err) => {
                    tracing::warn!(index, error = %err, "Skipping device without a name");
                    continue;
                }
            };
            let config = device.default_output_config().ok();

            devices.push(DeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                channels: config.as_ref().map(|config| config.channels()),
                sample_rate: config.as_ref().map(|config| config.sample_rate().0),
            });
        }
        Ok(devices)
    }

    /// Resolve `selector` to a device.
    pub fn find(&self, selector: &DeviceSelector) -> RemoteAudioResult<Device> {
        let device = match selector {
            DeviceSelector::Default => self.host.default_output_device(),
            DeviceSelector::Index(index) => self.host.output_devices()?.nth(*index),
            DeviceSelector::Name(query) => self.host.output_devices()?.find(|device| {
                device
                    .name()
                    .is_ok_and(|name| name_matches(&name, query))
            }),
        };

        let device = device.ok_or_else(|| RemoteAudioError::device_not_found(selector.to_string()))?;
        tracing::debug!(
            %selector,
            device = %device.name().unwrap_or_else(|_| "<unnamed>".to_string()),
            "Selected output device"
        );
        Ok(device)
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceManager")
            .field("host", &self.host_name())
            .finish()
    }
}
