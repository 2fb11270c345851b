//! Job runner: wires the configured model, environment, and averaging
//! stages together and writes the resulting curves.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use iris_core::averaging::{
    dropsize_average, wavelength_average, DropSizeOptions, LogNormal, ModelRequest, SourceDisc,
    WavelengthOptions,
};
use iris_core::grid;
use iris_core::model::{MieBuild, ModelKind};
use iris_core::types::{BowOrder, Polarisation, RaySelection};
use iris_materials::environment::SolarEnvironment;

use crate::config::JobConfig;

/// One computed intensity profile.
#[derive(Debug, Serialize)]
pub struct Curve {
    /// Descriptive label ("a = 2.0e-4 m", channel names, ...).
    pub label: String,
    /// Channel names matching `values` rows.
    pub channels: Vec<String>,
    /// Scattering angles in degrees.
    pub theta_deg: Vec<f64>,
    /// One row per channel.
    pub values: Vec<Vec<f64>>,
}

/// Resolve the configured ray selection and polarisation.
fn build_request(job: &JobConfig) -> Result<ModelRequest> {
    let selection = if job.model.full_series {
        RaySelection::Full
    } else if let Some(orders) = &job.model.debye_orders {
        RaySelection::Debye(orders.clone())
    } else {
        RaySelection::Bow(BowOrder::try_from(job.model.order)?)
    };

    if job.model.kind != ModelKind::Mie
        && !matches!(selection, RaySelection::Bow(_))
    {
        bail!(
            "{} model supports only bow-order selections",
            job.model.kind
        );
    }

    let polarisation = Polarisation::try_from(job.model.polarisation)?;
    let source = SourceDisc {
        radius: job.source.radius,
        step: job.source.step,
    };
    Ok(ModelRequest::new(selection, polarisation).with_source(source))
}

fn angle_grid(job: &JobConfig) -> Vec<f64> {
    grid::linspace(
        job.angles.range_deg[0].to_radians(),
        job.angles.range_deg[1].to_radians(),
        job.angles.points,
    )
}

fn wavelength_options(job: &JobConfig) -> WavelengthOptions {
    WavelengthOptions {
        band: (job.illumination.band[0], job.illumination.band[1]),
        samples: job.illumination.samples,
        temperature: job.illumination.temperature,
        include_white: job.illumination.white_channel,
    }
}

fn spectral_channel_names(white: bool) -> Vec<String> {
    let mut names = vec!["red".into(), "green".into(), "blue".into()];
    if white {
        names.push("white".into());
    }
    names
}

/// Evaluate one curve for a single mean drop radius.
fn run_radius(
    job: &JobConfig,
    theta: &[f64],
    radius: f64,
    environment: &SolarEnvironment,
    request: &ModelRequest,
) -> Result<Curve> {
    use iris_core::averaging::SpectralEnvironment;

    let theta_deg: Vec<f64> = theta.iter().map(|t| t.to_degrees()).collect();
    let kind = job.model.kind;

    if job.drops.sigma > 0.0 {
        let options = DropSizeOptions {
            sigma: job.drops.sigma,
            width: job.drops.width,
            samples: job.drops.samples,
        };
        let profile = dropsize_average(
            kind,
            theta,
            radius,
            &LogNormal::default(),
            &options,
            job.illumination.wavelength,
            environment,
            &wavelength_options(job),
            request,
        )?;
        let channels = if job.illumination.wavelength.is_some() {
            vec!["intensity".into()]
        } else {
            spectral_channel_names(job.illumination.white_channel)
        };
        return Ok(Curve {
            label: format!("a = {radius:.3e} m, sigma = {:.3e} m", job.drops.sigma),
            channels,
            theta_deg,
            values: profile.outer_iter().map(|row| row.to_vec()).collect(),
        });
    }

    match job.illumination.wavelength {
        None => {
            let profile = wavelength_average(
                kind,
                theta,
                kind.requires_size_parameter().then_some(radius),
                environment,
                &wavelength_options(job),
                request,
            )?;
            Ok(Curve {
                label: format!("a = {radius:.3e} m"),
                channels: spectral_channel_names(job.illumination.white_channel),
                theta_deg,
                values: profile.outer_iter().map(|row| row.to_vec()).collect(),
            })
        }
        Some(wavelength) => {
            let m = environment.refractive_index(wavelength);
            let x = kind
                .requires_size_parameter()
                .then(|| 2.0 * std::f64::consts::PI * radius / wavelength);
            let mie = MieBuild {
                debye_max: request.debye_max,
                cache: None,
            };
            let model = kind.instantiate(m, x, &mie)?;
            let curve = model.averaged_intensity(
                theta,
                &request.selection,
                request.polarisation,
                &request.source,
            )?;
            Ok(Curve {
                label: format!("a = {radius:.3e} m, lambda = {wavelength:.4e} m"),
                channels: vec!["intensity".into()],
                theta_deg,
                values: vec![curve],
            })
        }
    }
}

/// Run a full job: one curve per configured drop radius.
pub fn run_job(job: &JobConfig) -> Result<Vec<Curve>> {
    let environment = SolarEnvironment::new();
    let request = build_request(job)?;
    let theta = angle_grid(job);

    let radii = match &job.drops.radii {
        Some(radii) => {
            if radii.len() > 1 {
                grid::ensure_geometric(radii)
                    .context("drop radius sweep must be geometrically spaced")?;
            }
            radii.clone()
        }
        None => vec![job.drops.radius],
    };

    let mut curves = Vec::with_capacity(radii.len());
    for radius in radii {
        log::info!("computing {} curve for a = {radius:.3e} m", job.model.kind);
        curves.push(run_radius(job, &theta, radius, &environment, &request)?);
    }
    Ok(curves)
}

/// Write one CSV file per curve: theta_deg plus one column per channel.
pub fn write_csv(curves: &[Curve], directory: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;

    let mut paths = Vec::with_capacity(curves.len());
    for (index, curve) in curves.iter().enumerate() {
        let path = directory.join(format!("curve_{index:02}.csv"));
        let mut text = String::new();
        text.push_str("theta_deg");
        for channel in &curve.channels {
            text.push(',');
            text.push_str(channel);
        }
        text.push('\n');
        for (j, theta) in curve.theta_deg.iter().enumerate() {
            text.push_str(&format!("{theta:.6}"));
            for row in &curve.values {
                text.push_str(&format!(",{:.9e}", row[j]));
            }
            text.push('\n');
        }
        fs::write(&path, text)
            .with_context(|| format!("writing {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Write all curves to a single JSON document.
pub fn write_json(curves: &[Curve], directory: &Path) -> Result<PathBuf> {
    fs::create_dir_all(directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;
    let path = directory.join("curves.json");
    let text = serde_json::to_string_pretty(curves)?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Validate a configuration beyond what parsing enforces.
pub fn validate_job(job: &JobConfig) -> Result<()> {
    build_request(job)?;

    if job.angles.range_deg[1] <= job.angles.range_deg[0] {
        bail!("angle range is empty: {:?}", job.angles.range_deg);
    }
    if job.angles.points < 2 {
        bail!("angle grid needs at least 2 points");
    }

    let water = SolarEnvironment::new();
    for &edge in &job.illumination.band {
        if let Err(error) = water.water().index_within_band(edge) {
            log::warn!("illumination band extrapolates the dispersion table: {error}");
        }
    }

    if let Some(radii) = &job.drops.radii {
        if radii.is_empty() {
            bail!("drop radius sweep is empty");
        }
        if radii.len() > 1 {
            grid::ensure_geometric(radii)
                .context("drop radius sweep must be geometrically spaced")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_job(kind: &str) -> JobConfig {
        toml::from_str(&format!(
            r#"
            [model]
            kind = "{kind}"

            [angles]
            range_deg = [137.0, 141.0]
            points = 33

            [illumination]
            wavelength = 656.3e-9

            [drops]
            radius = 5e-5
            "#
        ))
        .unwrap()
    }

    #[test]
    fn monochromatic_airy_job_produces_one_curve() {
        let job = minimal_job("airy");
        let curves = run_job(&job).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].channels, vec!["intensity".to_string()]);
        assert_eq!(curves[0].theta_deg.len(), 33);
        assert!(curves[0].values[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn non_geometric_sweep_is_rejected() {
        let mut job = minimal_job("airy");
        job.drops.radii = Some(vec![1e-5, 2e-5, 3e-5]);
        assert!(validate_job(&job).is_err());
    }

    #[test]
    fn bad_polarisation_code_is_rejected() {
        let mut job = minimal_job("airy");
        job.model.polarisation = 5;
        assert!(validate_job(&job).is_err());
    }

    #[test]
    fn full_series_is_mie_only() {
        let mut job = minimal_job("young");
        job.model.full_series = true;
        assert!(validate_job(&job).is_err());
    }
}
