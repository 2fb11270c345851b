//! TOML configuration deserialisation for intensity-curve jobs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use iris_core::model::ModelKind;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub model: ModelConfig,
    pub angles: AngleConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub illumination: IlluminationConfig,
    #[serde(default)]
    pub drops: DropConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which theory to run and which rays to ask it for.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Bow order: 1 = primary, 2 = secondary.
    #[serde(default = "default_order")]
    pub order: usize,
    /// Polarisation code: 0 = unpolarised, 1 = perpendicular,
    /// 2 = parallel.
    #[serde(default)]
    pub polarisation: u8,
    /// Explicit Debye orders to sum (Mie only); overrides `order`.
    pub debye_orders: Option<Vec<usize>>,
    /// Full multipole series (Mie only); overrides everything else.
    #[serde(default)]
    pub full_series: bool,
}

fn default_order() -> usize {
    1
}

/// Scattering-angle grid, in degrees.
#[derive(Debug, Deserialize)]
pub struct AngleConfig {
    pub range_deg: [f64; 2],
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_points() -> usize {
    512
}

/// Finite source disk, in radians.
#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_radius")]
    pub radius: f64,
    #[serde(default = "default_source_step")]
    pub step: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            radius: default_source_radius(),
            step: default_source_step(),
        }
    }
}

fn default_source_radius() -> f64 {
    iris_core::averaging::SUN_RADIUS
}

fn default_source_step() -> f64 {
    1e-3
}

/// Illumination: a fixed wavelength, or a black-body band to average.
#[derive(Debug, Deserialize)]
pub struct IlluminationConfig {
    /// Fixed wavelength in metres; omit to average over the band.
    pub wavelength: Option<f64>,
    #[serde(default = "default_band")]
    pub band: [f64; 2],
    #[serde(default = "default_wavelength_samples")]
    pub samples: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub white_channel: bool,
}

impl Default for IlluminationConfig {
    fn default() -> Self {
        Self {
            wavelength: None,
            band: default_band(),
            samples: default_wavelength_samples(),
            temperature: default_temperature(),
            white_channel: false,
        }
    }
}

fn default_band() -> [f64; 2] {
    [380e-9, 700e-9]
}

fn default_wavelength_samples() -> usize {
    16
}

fn default_temperature() -> f64 {
    5783.0
}

/// Drop radii: a mean with optional spread, or an explicit geometric
/// sweep.
#[derive(Debug, Deserialize)]
pub struct DropConfig {
    /// Mean radius in metres.
    #[serde(default = "default_drop_radius")]
    pub radius: f64,
    /// Standard deviation of the radius in metres; 0 disables averaging.
    #[serde(default)]
    pub sigma: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_dropsize_samples")]
    pub samples: usize,
    /// Geometrically spaced radii to sweep, one output curve each.
    pub radii: Option<Vec<f64>>,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            radius: default_drop_radius(),
            sigma: 0.0,
            width: default_width(),
            samples: default_dropsize_samples(),
            radii: None,
        }
    }
}

fn default_drop_radius() -> f64 {
    2e-4
}

fn default_width() -> f64 {
    0.95
}

fn default_dropsize_samples() -> usize {
    16
}

/// Output destination and formats.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_true")]
    pub save_csv: bool,
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_directory() -> String {
    "out".into()
}

fn default_true() -> bool {
    true
}

/// Load and parse a job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    let job: JobConfig = toml::from_str(&text)
        .with_context(|| format!("parsing configuration from {}", path.display()))?;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_configuration_fills_defaults() {
        let job: JobConfig = toml::from_str(
            r#"
            [model]
            kind = "airy"

            [angles]
            range_deg = [136.0, 142.0]
            "#,
        )
        .unwrap();
        assert_eq!(job.model.kind, ModelKind::Airy);
        assert_eq!(job.model.order, 1);
        assert_eq!(job.angles.points, 512);
        assert_eq!(job.drops.radius, 2e-4);
        assert!(job.output.save_csv);
        assert!(job.illumination.wavelength.is_none());
    }

    #[test]
    fn mie_sweep_configuration_parses() {
        let job: JobConfig = toml::from_str(
            r#"
            [model]
            kind = "mie"
            full_series = true
            polarisation = 1

            [angles]
            range_deg = [0.0, 180.0]
            points = 1024

            [illumination]
            wavelength = 656.3e-9

            [drops]
            radii = [1e-5, 1e-4, 1e-3]
            "#,
        )
        .unwrap();
        assert!(job.model.full_series);
        assert_eq!(job.drops.radii.as_deref(), Some(&[1e-5, 1e-4, 1e-3][..]));
    }
}
