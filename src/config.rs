//! # Configuration related

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::HelperE;

/// Optional override for the sysfs roots, only root should be able to write here.
pub const CONFIG_PATH: &str = "/etc/intel-power-control-helper.toml";

/// Base directories every control file path is built from.
/// Missing keys fall back to the usual sysfs locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Roots {
    /// holds `cpuN/online`
    pub cpu: PathBuf,
    /// holds `cardN/gt_*_freq_mhz`
    pub drm: PathBuf,
    /// holds `brightness`
    pub backlight: PathBuf,
}

impl Default for Roots {
    fn default() -> Self {
        Self {
            cpu: "/sys/devices/system/cpu".into(),
            drm: "/sys/class/drm".into(),
            backlight: "/sys/class/backlight/intel_backlight".into(),
        }
    }
}

/// toml + serde to get the roots, defaults when there is no config file
pub fn parse_conf() -> Result<Roots, HelperE> {
    load(Path::new(CONFIG_PATH))
}

fn load(p: &Path) -> Result<Roots, HelperE> {
    if !p.exists() {
        return Ok(Roots::default());
    }

    let contents = read_to_string(p)
        .map_err(|e| HelperE::Read(e, p.display().to_string()))?;
    let roots: Roots = toml::from_str(&contents)?;
    debug!(?roots, config = %p.display(), "loaded sysfs roots");
    Ok(roots)
}
