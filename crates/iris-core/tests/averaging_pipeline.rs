//! Integration tests for the three averaging stages, using a flat
//! spectral environment so every property is checked against the bare
//! models themselves.

use std::f64::consts::PI;

use iris_core::averaging::{
    dropsize_average, wavelength_average, DropSizeOptions, LogNormal, ModelRequest, SourceDisc,
    SpectralEnvironment, WavelengthOptions,
};
use iris_core::error::ModelError;
use iris_core::grid;
use iris_core::model::{MieBuild, ModelKind};
use iris_core::types::{BowOrder, Polarisation, RaySelection};

/// Constant-index, flat-spectrum, white-response environment.
struct FlatEnvironment {
    m: f64,
}

impl SpectralEnvironment for FlatEnvironment {
    fn refractive_index(&self, _wavelength: f64) -> f64 {
        self.m
    }

    fn spectral_radiance(&self, _wavelength: f64, _temperature: f64) -> f64 {
        1.0
    }

    fn colour_response(&self, _wavelength: f64) -> [f64; 3] {
        [1.0, 1.0, 1.0]
    }
}

fn primary_request() -> ModelRequest {
    ModelRequest::new(
        RaySelection::Bow(BowOrder::Primary),
        Polarisation::Unpolarised,
    )
}

fn bow_grid() -> Vec<f64> {
    grid::linspace(f64::to_radians(136.0), f64::to_radians(142.0), 121)
}

#[test]
fn geometric_singularity_becomes_finite_under_source_averaging() {
    let env = FlatEnvironment { m: 1.331 };
    let model = ModelKind::Geometric
        .instantiate(env.m, None, &MieBuild::default())
        .unwrap();
    let theta_r = model.geometry().theta_r[0];

    // Unaveraged: arbitrarily large just outside the rainbow angle.
    let singular = model
        .intensity(
            &[theta_r + 1e-9],
            &RaySelection::Bow(BowOrder::Primary),
            Polarisation::Unpolarised,
        )
        .unwrap()[0];

    let averaged = model
        .averaged_intensity(
            &bow_grid(),
            &RaySelection::Bow(BowOrder::Primary),
            Polarisation::Unpolarised,
            &SourceDisc::default(),
        )
        .unwrap();

    for v in &averaged {
        assert!(v.is_finite());
    }
    // The smoothed peak is finite and far below the near-caustic value,
    // but the bright band still stands and the dark band stays dark.
    let peak = averaged.iter().cloned().fold(0.0_f64, f64::max);
    assert!(peak > 0.0);
    assert!(singular > 50.0 * peak, "caustic {singular} vs averaged peak {peak}");
    assert_eq!(averaged[0], 0.0);
}

#[test]
fn zero_width_band_reproduces_the_monochromatic_result() {
    let env = FlatEnvironment { m: 1.331 };
    let wavelength = 656.3e-9;
    let radius = 2e-4;
    let theta = bow_grid();
    let request = primary_request();

    let options = WavelengthOptions {
        band: (wavelength, wavelength),
        samples: 4,
        temperature: 5783.0,
        include_white: true,
    };
    let spectral = wavelength_average(
        ModelKind::Airy,
        &theta,
        Some(radius),
        &env,
        &options,
        &request,
    )
    .unwrap();

    let model = ModelKind::Airy
        .instantiate(env.m, Some(2.0 * PI * radius / wavelength), &MieBuild::default())
        .unwrap();
    let direct = model
        .averaged_intensity(
            &theta,
            &request.selection,
            request.polarisation,
            &request.source,
        )
        .unwrap();

    for (j, expected) in direct.iter().enumerate() {
        approx::assert_relative_eq!(spectral[[3, j]], *expected, max_relative = 1e-12);
        // Flat colour response: every channel collapses to the white one.
        approx::assert_relative_eq!(spectral[[0, j]], *expected, max_relative = 1e-12);
    }
}

#[test]
fn zero_sigma_dropsize_averaging_is_the_identity() {
    let env = FlatEnvironment { m: 1.331 };
    let wavelength = 656.3e-9;
    let radius = 2e-4;
    let theta = bow_grid();
    let request = primary_request();

    let averaged = dropsize_average(
        ModelKind::Airy,
        &theta,
        radius,
        &LogNormal::default(),
        &DropSizeOptions::default(),
        Some(wavelength),
        &env,
        &WavelengthOptions::default(),
        &request,
    )
    .unwrap();

    let model = ModelKind::Airy
        .instantiate(env.m, Some(2.0 * PI * radius / wavelength), &MieBuild::default())
        .unwrap();
    let direct = model
        .averaged_intensity(
            &theta,
            &request.selection,
            request.polarisation,
            &request.source,
        )
        .unwrap();

    assert_eq!(averaged.shape(), &[1, theta.len()]);
    for (j, expected) in direct.iter().enumerate() {
        assert_eq!(averaged[[0, j]], *expected);
    }
}

#[test]
fn negative_drop_radii_are_rejected_not_clamped() {
    let env = FlatEnvironment { m: 1.331 };
    let request = primary_request();
    let options = DropSizeOptions {
        sigma: 1e-2, // far wider than the 0.2 mm mean radius
        width: 0.95,
        samples: 8,
    };

    let err = dropsize_average(
        ModelKind::Airy,
        &bow_grid(),
        2e-4,
        &LogNormal::default(),
        &options,
        Some(656.3e-9),
        &env,
        &WavelengthOptions::default(),
        &request,
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::NegativeDropRadius { .. }));
}

#[test]
fn dropsize_averaging_smooths_the_supernumerary_fringes() {
    let env = FlatEnvironment { m: 1.331 };
    let wavelength = 656.3e-9;
    let theta = bow_grid();
    let request = primary_request();

    let narrow = dropsize_average(
        ModelKind::Airy,
        &theta,
        2e-4,
        &LogNormal::default(),
        &DropSizeOptions::default(),
        Some(wavelength),
        &env,
        &WavelengthOptions::default(),
        &request,
    )
    .unwrap();
    let broad = dropsize_average(
        ModelKind::Airy,
        &theta,
        2e-4,
        &LogNormal::default(),
        &DropSizeOptions {
            sigma: 5e-5,
            width: 0.95,
            samples: 16,
        },
        Some(wavelength),
        &env,
        &WavelengthOptions::default(),
        &request,
    )
    .unwrap();

    let variation = |row: &[f64]| {
        row.windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .sum::<f64>()
    };
    let narrow_row: Vec<f64> = narrow.row(0).to_vec();
    let broad_row: Vec<f64> = broad.row(0).to_vec();
    assert!(
        variation(&broad_row) < variation(&narrow_row),
        "size dispersion failed to smooth the fringes"
    );
}

#[test]
fn spectral_averaging_covers_all_four_models() {
    let env = FlatEnvironment { m: 1.331 };
    let theta = grid::linspace(f64::to_radians(137.5), f64::to_radians(141.0), 36);
    let request = primary_request();
    let options = WavelengthOptions {
        samples: 3,
        ..WavelengthOptions::default()
    };

    for kind in [
        ModelKind::Geometric,
        ModelKind::Young,
        ModelKind::Airy,
        ModelKind::Mie,
    ] {
        let radius = kind.requires_size_parameter().then_some(5e-5);
        let out =
            wavelength_average(kind, &theta, radius, &env, &options, &request).unwrap();
        assert_eq!(out.shape(), &[3, theta.len()]);
        assert!(
            out.iter().all(|v| v.is_finite() && *v >= 0.0),
            "{kind} produced non-finite averages"
        );
    }
}
