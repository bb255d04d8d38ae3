//! # Writes into /sys
//!
//! One attempt per file, handles are dropped right after the single read or write.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::check::{DeviceId, Value};
use crate::config::Roots;
use crate::HelperE;

/// GPU frequency control files under `/sys/class/drm/cardN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqField {
    Min,
    Max,
    Boost,
}

impl FreqField {
    pub fn file_name(self) -> &'static str {
        match self {
            FreqField::Min => "gt_min_freq_mhz",
            FreqField::Max => "gt_max_freq_mhz",
            FreqField::Boost => "gt_boost_freq_mhz",
        }
    }
}

/// Flips `<cpu-root>/<cpu>/online`: reads the current state digit and writes back its opposite.
/// Returns the state that was written.
pub fn toggle_cpu(roots: &Roots, cpu: &DeviceId) -> Result<u8, HelperE> {
    let path = roots.cpu.join(cpu.as_str()).join("online");
    let p = path.display().to_string();
    debug!(%cpu, path = %p, "toggling cpu");

    let mut state = [0u8; 1];
    let read = File::open(&path)
        .map_err(|e| HelperE::Open(e, p.clone()))?
        .read(&mut state)
        .map_err(|e| HelperE::Read(e, p.clone()))?;
    if read == 0 {
        return Err(HelperE::EmptyRead(p));
    }

    let new = flip(state[0]).ok_or_else(|| HelperE::BadState(char::from(state[0]), p.clone()))?;
    write_once(&path, &[new])?;

    info!(%cpu, from = %char::from(state[0]), to = %char::from(new), "cpu toggled");
    Ok(new)
}

/// `'0'` <-> `'1'`, any other digit maps by parity
fn flip(state: u8) -> Option<u8> {
    state
        .is_ascii_digit()
        .then(|| b'0' + (state - b'0' + 1) % 2)
}

/// Writes `val` to `<drm-root>/<gpu>/gt_*_freq_mhz`.
pub fn set_mhz(roots: &Roots, gpu: &DeviceId, field: FreqField, val: &Value) -> Result<(), HelperE> {
    let path = roots.drm.join(gpu.as_str()).join(field.file_name());
    debug!(%gpu, field = field.file_name(), %val, path = %path.display(), "setting gpu clock");

    write_once(&path, val.as_bytes())?;

    info!(%gpu, field = field.file_name(), mhz = %val, "gpu clock set");
    Ok(())
}

/// Writes `val` to `<backlight-root>/brightness`.
pub fn set_brightness(roots: &Roots, val: &Value) -> Result<(), HelperE> {
    let path = roots.backlight.join("brightness");
    debug!(%val, path = %path.display(), "setting brightness");

    write_once(&path, val.as_bytes())?;

    info!(brightness = %val, "brightness set");
    Ok(())
}

/// Truncates `path` and writes `buf` with a single `write` call, no newline added.
/// sysfs attributes take the whole value in one go, so a short count is an error rather than
/// something to loop on.
fn write_once(path: &Path, buf: &[u8]) -> Result<(), HelperE> {
    let p = path.display().to_string();
    let written = File::create(path)
        .map_err(|e| HelperE::Open(e, p.clone()))?
        .write(buf)
        .map_err(|e| HelperE::Write(e, p.clone()))?;

    if written != buf.len() {
        return Err(HelperE::ShortWrite { path: p, expected: buf.len(), written });
    }
    Ok(())
}
