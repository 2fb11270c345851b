//! Core vocabulary types shared across the scattering models.
//!
//! Ray order is 1-based throughout: the primary bow is one internal
//! reflection, the secondary is two. Polarisation follows the 0/1/2 wire
//! codes of the Fresnel formulas (unpolarised, perpendicular, parallel);
//! both enums convert fallibly from those codes for configuration parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Bow order: how many internal reflections the ray family makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BowOrder {
    /// One internal reflection, the bright main bow near 138°.
    Primary,
    /// Two internal reflections, the fainter outer bow near 129°.
    Secondary,
}

impl BowOrder {
    /// Number of internal reflections (1 or 2).
    pub fn reflections(self) -> u32 {
        match self {
            BowOrder::Primary => 1,
            BowOrder::Secondary => 2,
        }
    }

    /// Index into the per-bow angle tables of [`crate::geometry::BowGeometry`].
    pub fn index(self) -> usize {
        match self {
            BowOrder::Primary => 0,
            BowOrder::Secondary => 1,
        }
    }
}

impl TryFrom<usize> for BowOrder {
    type Error = ModelError;

    fn try_from(code: usize) -> Result<Self, ModelError> {
        match code {
            1 => Ok(BowOrder::Primary),
            2 => Ok(BowOrder::Secondary),
            other => Err(ModelError::InvalidOrder(other)),
        }
    }
}

impl fmt::Display for BowOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BowOrder::Primary => write!(f, "primary"),
            BowOrder::Secondary => write!(f, "secondary"),
        }
    }
}

/// Polarisation channel of the incident/scattered light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarisation {
    /// Mean of the two linear channels.
    Unpolarised,
    /// Electric field perpendicular to the scattering plane.
    Perpendicular,
    /// Electric field parallel to the scattering plane.
    Parallel,
}

impl TryFrom<u8> for Polarisation {
    type Error = ModelError;

    fn try_from(code: u8) -> Result<Self, ModelError> {
        match code {
            0 => Ok(Polarisation::Unpolarised),
            1 => Ok(Polarisation::Perpendicular),
            2 => Ok(Polarisation::Parallel),
            other => Err(ModelError::InvalidPolarisation(other)),
        }
    }
}

/// Which ray contributions an intensity query asks for.
///
/// Geometric, Young, and Airy models accept only [`RaySelection::Bow`].
/// The Mie model accepts all three: the full multipole series, a single
/// bow (mapped onto the corresponding Debye term), or an explicit set of
/// Debye orders summed coherently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaySelection {
    /// A single geometric bow (primary or secondary).
    Bow(BowOrder),
    /// Full Mie series, all ray families combined.
    Full,
    /// Sum of the given Debye orders `p` (p = 0 is diffraction plus
    /// external reflection, p = 2 the primary bow, p = 3 the secondary).
    Debye(Vec<usize>),
}

impl RaySelection {
    /// The bow order, when the selection is a single bow.
    pub fn bow_order(&self) -> Option<BowOrder> {
        match self {
            RaySelection::Bow(order) => Some(*order),
            _ => None,
        }
    }

    /// Largest Debye order the selection needs, if it needs the
    /// decomposition at all.
    pub fn max_debye_order(&self) -> Option<usize> {
        match self {
            RaySelection::Bow(order) => Some(order.reflections() as usize + 1),
            RaySelection::Full => None,
            RaySelection::Debye(orders) => orders.iter().copied().max().or(Some(0)),
        }
    }
}

impl fmt::Display for RaySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaySelection::Bow(order) => write!(f, "{order} bow"),
            RaySelection::Full => write!(f, "full series"),
            RaySelection::Debye(orders) => write!(f, "Debye orders {orders:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bow_order_codes_round_trip() {
        assert_eq!(BowOrder::try_from(1).unwrap(), BowOrder::Primary);
        assert_eq!(BowOrder::try_from(2).unwrap(), BowOrder::Secondary);
        assert!(matches!(
            BowOrder::try_from(3),
            Err(ModelError::InvalidOrder(3))
        ));
    }

    #[test]
    fn polarisation_codes_round_trip() {
        assert_eq!(Polarisation::try_from(0).unwrap(), Polarisation::Unpolarised);
        assert_eq!(Polarisation::try_from(2).unwrap(), Polarisation::Parallel);
        assert!(matches!(
            Polarisation::try_from(7),
            Err(ModelError::InvalidPolarisation(7))
        ));
    }

    #[test]
    fn bow_selection_maps_to_debye_order() {
        assert_eq!(
            RaySelection::Bow(BowOrder::Primary).max_debye_order(),
            Some(2)
        );
        assert_eq!(
            RaySelection::Bow(BowOrder::Secondary).max_debye_order(),
            Some(3)
        );
        assert_eq!(RaySelection::Full.max_debye_order(), None);
        assert_eq!(
            RaySelection::Debye(vec![0, 2, 5]).max_debye_order(),
            Some(5)
        );
    }
}
