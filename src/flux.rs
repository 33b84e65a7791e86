// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Source flux model (component C5): band-dependent flux density at a
//! given (u,v) baseline projection (spec.md §4.4/§6).

/// One Gaussian brightness component (spec.md §6's flux-model component
/// list): flux in Jy, major/minor axis in milliarcseconds, position angle
/// in degrees (east of north).
#[derive(Clone, Copy, Debug)]
pub struct GaussianComponent {
    pub flux_jy: f64,
    pub major_mas: f64,
    pub minor_mas: f64,
    pub position_angle_deg: f64,
}

impl GaussianComponent {
    /// Visibility amplitude (Jy) this component contributes at the given
    /// (u, v) in wavelengths (cycles per radian).
    fn visibility(&self, u: f64, v: f64) -> f64 {
        let mas_to_rad = std::f64::consts::PI / (180.0 * 3600.0 * 1000.0);
        let major = self.major_mas * mas_to_rad;
        let minor = self.minor_mas * mas_to_rad;
        let pa = self.position_angle_deg.to_radians();

        let (sin_pa, cos_pa) = pa.sin_cos();
        let u_major = u * cos_pa + v * sin_pa;
        let v_minor = -u * sin_pa + v * cos_pa;

        let k = std::f64::consts::PI * std::f64::consts::PI / (4.0 * std::f64::consts::LN_2);
        self.flux_jy * (-k * (major * major * u_major * u_major + minor * minor * v_minor * v_minor)).exp()
    }
}

/// A piecewise power-law knot: baseline length (kilo-wavelengths) and flux
/// density (Jy) at that length.
#[derive(Clone, Copy, Debug)]
pub struct PowerLawKnot {
    pub baseline_klambda: f64,
    pub flux_jy: f64,
}

/// Either representation spec.md §3 allows for a source's per-band flux
/// model.
#[derive(Clone, Debug)]
pub enum FluxModel {
    PowerLaw { knots: Vec<PowerLawKnot> },
    Gaussian { components: Vec<GaussianComponent> },
}

impl FluxModel {
    /// Flux density (Jy) toward a baseline with (u, v) in wavelengths.
    pub fn flux_at_uv(&self, u: f64, v: f64) -> f64 {
        match self {
            FluxModel::Gaussian { components } => {
                components.iter().map(|c| c.visibility(u, v)).sum()
            }
            FluxModel::PowerLaw { knots } => {
                let radius_klambda = (u * u + v * v).sqrt() / 1000.0;
                power_law_lookup(knots, radius_klambda)
            }
        }
    }
}

fn power_law_lookup(knots: &[PowerLawKnot], radius_klambda: f64) -> f64 {
    if knots.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<PowerLawKnot> = knots.to_vec();
    sorted.sort_by(|a, b| a.baseline_klambda.partial_cmp(&b.baseline_klambda).unwrap());

    if radius_klambda <= sorted[0].baseline_klambda {
        return sorted[0].flux_jy;
    }
    if radius_klambda >= sorted[sorted.len() - 1].baseline_klambda {
        return sorted[sorted.len() - 1].flux_jy;
    }
    for window in sorted.windows(2) {
        let (x0, y0) = (window[0].baseline_klambda, window[0].flux_jy);
        let (x1, y1) = (window[1].baseline_klambda, window[1].flux_jy);
        if radius_klambda >= x0 && radius_klambda <= x1 {
            if x0 <= 0.0 || y0 <= 0.0 || y1 <= 0.0 {
                // Degenerate knot: fall back to linear interpolation.
                let frac = (radius_klambda - x0) / (x1 - x0);
                return y0 + frac * (y1 - y0);
            }
            // Power law: y = y0 * (x/x0)^p, with p chosen to match y1 at x1.
            let p = (y1 / y0).ln() / (x1 / x0).ln();
            return y0 * (radius_klambda / x0).powf(p);
        }
    }
    sorted[sorted.len() - 1].flux_jy
}

/// Project a station-pair baseline vector (ECEF delta, metres) onto the
/// (u, v) plane of a source at hour angle `ha` and declination `dec`,
/// returning (u, v) in metres (divide by wavelength for cycles-per-radian
/// units), per the standard interferometric projection (Thompson, Moran &
/// Swenson, eq. 4.1).
pub fn project_uv(dx: f64, dy: f64, dz: f64, ha: f64, dec: f64) -> (f64, f64) {
    let (sin_ha, cos_ha) = ha.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    let u = sin_ha * dx + cos_ha * dy;
    let v = -sin_dec * cos_ha * dx + sin_dec * sin_ha * dy + cos_dec * dz;
    (u, v)
}
