//! Query and index parameters.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PprConfig {
    /// Whether arcs are one-way. For undirected graphs every edge update is mirrored.
    pub is_directed: bool,
    pub(crate) alpha: f64,
    /// Relative error bound.
    pub eps: f64,
    /// Smallest PPR value the error bound applies to.
    pub delta: f64,
    /// Failure probability.
    pub pf: f64,
    /// Forward-push residual threshold, per unit of degree.
    pub rmax: f64,
}

impl Default for PprConfig {
    /// `omega() == 12` with these values.
    fn default() -> Self {
        Self {
            is_directed: true,
            alpha: 0.2,
            eps: 0.3,
            delta: 0.1,
            pf: 0.01,
            rmax: 0.01,
        }
    }
}

impl PprConfig {
    pub fn new(is_directed: bool, alpha: f64, eps: f64, delta: f64, pf: f64, rmax: f64) -> Self {
        Self {
            is_directed,
            alpha,
            eps,
            delta,
            pf,
            rmax,
        }
    }

    /// Restart probability.
    ///
    /// Once an index is built from this config, α only changes through
    /// [`crate::PprIndex::update_alpha`].
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Replace α before any index is built from this config.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Number of walks (forests) per node needed for the `(eps, delta, pf)` guarantee at
    /// residual threshold `rmax`. Truncated to a whole count, never below 1.
    pub fn omega(&self) -> usize {
        let w = self.rmax * (2.0 + self.eps * 2.0 / 3.0) * (2.0 / self.pf).ln()
            / (self.eps * self.eps * self.delta);
        if w.is_finite() && w >= 1.0 {
            w as usize
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;
        for (name, value) in [("eps", self.eps), ("delta", self.delta), ("rmax", self.rmax)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be finite and > 0 (got {value})"
                )));
            }
        }
        if !(self.pf > 0.0 && self.pf < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "pf must be in (0, 1) (got {})",
                self.pf
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "alpha must be in (0, 1) (got {alpha})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_omega_is_twelve() {
        assert_eq!(PprConfig::default().omega(), 12);
    }

    #[test]
    fn omega_never_drops_below_one() {
        let c = PprConfig::new(true, 0.2, 0.5, 0.5, 0.5, 1e-9);
        assert_eq!(c.omega(), 1);
    }

    #[test]
    fn validate_rejects_bad_alpha_and_pf() {
        assert!(PprConfig::default().validate().is_ok());
        let err = PprConfig::default().with_alpha(1.0).validate().unwrap_err();
        assert!(format!("{err}").contains("alpha"));
        let mut c = PprConfig::default();
        c.pf = 0.0;
        assert!(format!("{}", c.validate().unwrap_err()).contains("pf"));
        c = PprConfig::default();
        c.rmax = f64::NAN;
        assert!(format!("{}", c.validate().unwrap_err()).contains("rmax"));
    }
}
