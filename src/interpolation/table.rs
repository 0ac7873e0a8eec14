use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::constants::{MAX_INTERPOL, MAX_ORDER, MIN_ORDER};
use crate::error::{AssignError, Result};
use super::bspline::{assignment_weight, assignment_weight_derivative};

/// (order, with derivatives, max_interpol)
type TableKey = (usize, bool, usize);

static TABLE_CACHE: OnceLock<Mutex<HashMap<TableKey, Arc<InterpolationTable>>>> = OnceLock::new();

/// Assignment weights sampled at `2 * max_interpol + 1` sub-cell offsets.
///
/// Row `s` holds the `order` stencil weights for a particle sitting at
/// offset `x = (s - max_interpol) / (2 max_interpol)` from its reference
/// mesh point. Rows are contiguous so a stencil axis is one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTable {
    order: usize,
    max_interpol: usize,
    samples: usize,
    weights: Vec<f64>,
    derivatives: Option<Vec<f64>>,
}

impl InterpolationTable {
    /// Builds the table at the default resolution.
    pub fn build(order: usize, with_derivative: bool) -> Result<Self> {
        Self::with_resolution(order, with_derivative, MAX_INTERPOL)
    }

    pub fn with_resolution(order: usize, with_derivative: bool,
                           max_interpol: usize) -> Result<Self> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            return Err(AssignError::UnsupportedOrder(order));
        }
        if max_interpol == 0 {
            return Err(AssignError::InvalidTableResolution);
        }

        let samples = 2 * max_interpol + 1;
        let denom = 2.0 * max_interpol as f64;
        let mut weights = Vec::with_capacity(samples * order);
        let mut derivatives = with_derivative.then(|| Vec::with_capacity(samples * order));

        for s in 0..samples {
            let x = (s as f64 - max_interpol as f64) / denom;
            for j in 0..order {
                weights.push(assignment_weight(order, j, x));
                if let Some(d) = derivatives.as_mut() {
                    d.push(assignment_weight_derivative(order, j, x));
                }
            }
        }

        log::debug!("built interpolation table: order {order}, {samples} samples, derivatives {with_derivative}");
        Ok(Self { order, max_interpol, samples, weights, derivatives })
    }

    /// Process-wide table for `(order, with_derivative)` at the default
    /// resolution. Built on first use and shared read-only afterwards.
    pub fn shared(order: usize, with_derivative: bool) -> Result<Arc<Self>> {
        Self::shared_with_resolution(order, with_derivative, MAX_INTERPOL)
    }

    pub fn shared_with_resolution(order: usize, with_derivative: bool,
                                  max_interpol: usize) -> Result<Arc<Self>> {
        let cache = TABLE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        // tables are immutable once inserted, a poisoned lock still holds valid ones
        let mut guard = cache.lock().unwrap_or_else(|e| e.into_inner());

        let key = (order, with_derivative, max_interpol);
        if let Some(table) = guard.get(&key) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(Self::with_resolution(order, with_derivative, max_interpol)?);
        log::info!("caching interpolation table for order {order} (derivatives: {with_derivative})");
        guard.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn max_interpol(&self) -> usize {
        self.max_interpol
    }

    /// Number of sampled sub-cell offsets, `S`.
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn has_derivatives(&self) -> bool {
        self.derivatives.is_some()
    }

    /// Maps `pos - nmp + 0.5`, in `[0, 1]`, to a row index.
    #[inline]
    pub fn sample_index(&self, frac: f64) -> usize {
        let s = (frac * (2 * self.max_interpol) as f64).floor() as usize;
        debug_assert!(s < self.samples, "sub-cell fraction {frac} outside [0, 1]");
        s
    }

    /// Sub-cell offset represented by row `sample`.
    pub fn offset(&self, sample: usize) -> f64 {
        (sample as f64 - self.max_interpol as f64) / (2 * self.max_interpol) as f64
    }

    #[inline]
    pub fn weights(&self, sample: usize) -> &[f64] {
        &self.weights[sample * self.order..(sample + 1) * self.order]
    }

    #[inline]
    pub fn derivatives(&self, sample: usize) -> Option<&[f64]> {
        self.derivatives.as_ref()
            .map(|d| &d[sample * self.order..(sample + 1) * self.order])
    }

    #[inline]
    pub fn weight(&self, sample: usize, j: usize) -> f64 {
        self.weights[sample * self.order + j]
    }
}
