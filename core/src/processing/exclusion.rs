use crate::prelude::{PipelineError, PipelineResult, SurfaceOffset};
use std::collections::BTreeMap;

/// Valid vertical window of one ping, half-open `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionWindow {
    pub lower: f64,
    pub upper: f64,
}

impl ExclusionWindow {
    pub fn contains(&self, position: f64) -> bool {
        position >= self.lower && position < self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.upper <= self.lower
    }
}

#[derive(Debug, Clone)]
enum SurfaceBoundary {
    Constant(f64),
    Profile { name: String, values: Vec<f64> },
}

/// Per-ping surface and bottom exclusion, resolved once per run.
#[derive(Debug, Clone)]
pub struct ExclusionResolver {
    surface: SurfaceBoundary,
    bottom_offset: f64,
}

impl ExclusionResolver {
    /// Resolves the surface setting against the externally supplied profiles.
    pub fn new(
        surface: &SurfaceOffset,
        profiles: &BTreeMap<String, Vec<f64>>,
        bottom_offset: f64,
    ) -> PipelineResult<Self> {
        let surface = match surface {
            SurfaceOffset::Constant(offset) if offset.is_finite() => SurfaceBoundary::Constant(*offset),
            SurfaceOffset::Constant(offset) => {
                return Err(PipelineError::UnsupportedExclusionMode(format!(
                    "surface offset {}",
                    offset
                )))
            }
            SurfaceOffset::Profile(name) => match profiles.get(name) {
                Some(values) => SurfaceBoundary::Profile {
                    name: name.clone(),
                    values: values.clone(),
                },
                None => {
                    return Err(PipelineError::UnsupportedExclusionMode(format!(
                        "no surface profile named '{}' was supplied",
                        name
                    )))
                }
            },
        };
        if !bottom_offset.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "bottom offset {}",
                bottom_offset
            )));
        }
        Ok(Self {
            surface,
            bottom_offset,
        })
    }

    /// One window per ping. Without a bottom line the window is open below;
    /// non-finite bottom values leave that ping open below as well.
    pub fn resolve(&self, pings: usize, bottom_line: Option<&[f64]>) -> PipelineResult<Vec<ExclusionWindow>> {
        if let SurfaceBoundary::Profile { name, values } = &self.surface {
            if values.len() != pings {
                return Err(PipelineError::InvalidInput(format!(
                    "surface profile '{}' has {} values for {} pings",
                    name,
                    values.len(),
                    pings
                )));
            }
        }
        if let Some(bottom) = bottom_line {
            if bottom.len() != pings {
                return Err(PipelineError::InvalidInput(format!(
                    "bottom line has {} values for {} pings",
                    bottom.len(),
                    pings
                )));
            }
        }

        let windows = (0..pings)
            .map(|ping| {
                let lower = match &self.surface {
                    SurfaceBoundary::Constant(offset) => *offset,
                    SurfaceBoundary::Profile { values, .. } => values[ping],
                };
                let upper = match bottom_line.map(|b| b[ping]) {
                    Some(bottom) if bottom.is_finite() => (bottom - self.bottom_offset).max(lower),
                    _ => f64::INFINITY,
                };
                ExclusionWindow { lower, upper }
            })
            .collect();
        Ok(windows)
    }
}
