use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AssignConfig;
use crate::constants::{DUMMY_G_MAX_SIZE, DUMMY_G_MIN_SIZE, DUMMY_G_STEP, MAX_INTERPOL};
use crate::error::{AssignError, Result};
use crate::interlace::ChargeAssigner;
use crate::interpolation::InterpolationTable;

/// State shared by the trials of one parameter-tuning loop.
///
/// Holds the tables built so far, keyed by `(order, derivatives)`, and a
/// placeholder influence function of ones for trials that only need
/// approximate reciprocal-space work. Everything is released when the
/// context is dropped at the end of the loop.
#[derive(Debug)]
pub struct TuningContext {
    max_interpol: usize,
    tables: HashMap<(usize, bool), Arc<InterpolationTable>>,
    influence: Vec<f64>,
    influence_size: usize,
}

impl Default for TuningContext {
    fn default() -> Self {
        Self { max_interpol: MAX_INTERPOL, tables: HashMap::new(), influence: Vec::new(),
               influence_size: 0 }
    }
}

impl TuningContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(max_interpol: usize) -> Result<Self> {
        if max_interpol == 0 {
            return Err(AssignError::InvalidTableResolution);
        }
        Ok(Self { max_interpol, ..Self::default() })
    }

    /// Table for a trial order, built the first time that order is seen.
    pub fn table(&mut self, order: usize, with_derivative: bool) -> Result<Arc<InterpolationTable>> {
        if let Some(table) = self.tables.get(&(order, with_derivative)) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(InterpolationTable::with_resolution(order, with_derivative,
                                                                 self.max_interpol)?);
        log::debug!("tuning: built table for order {order} (derivatives: {with_derivative})");
        self.tables.insert((order, with_derivative), Arc::clone(&table));
        Ok(table)
    }

    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    /// Influence function of ones covering at least `mesh^3` cells.
    ///
    /// The buffer grows by `DUMMY_G_STEP` cells per axis, clamped to
    /// `[DUMMY_G_MIN_SIZE, DUMMY_G_MAX_SIZE]`, and never below `mesh`.
    pub fn influence_placeholder(&mut self, mesh: usize) -> &[f64] {
        if mesh > self.influence_size {
            let size = (self.influence_size + DUMMY_G_STEP)
                .clamp(DUMMY_G_MIN_SIZE, DUMMY_G_MAX_SIZE)
                .max(mesh);
            log::debug!("tuning: growing influence placeholder to {size}^3");
            self.influence.resize(size * size * size, 1.0);
            self.influence_size = size;
        }
        &self.influence[..mesh * mesh * mesh]
    }

    /// Per-axis size currently allocated for the placeholder.
    pub fn influence_size(&self) -> usize {
        self.influence_size
    }

    /// Assigner for one trial, sharing this context's table. The context's
    /// resolution overrides `config.max_interpol`.
    pub fn assigner(&mut self, config: AssignConfig) -> Result<ChargeAssigner> {
        config.validate()?;
        let table = self.table(config.order, config.derivatives)?;
        ChargeAssigner::with_table(AssignConfig { max_interpol: self.max_interpol, ..config }, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_built_once_per_order() {
        let mut ctx = TuningContext::with_resolution(32).unwrap();
        let a = ctx.table(3, false).unwrap();
        let b = ctx.table(3, false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        ctx.table(5, false).unwrap();
        ctx.table(3, true).unwrap();
        assert_eq!(ctx.cached_tables(), 3);
        assert_eq!(ctx.table(8, false).unwrap_err(), AssignError::UnsupportedOrder(8));
        assert_eq!(ctx.cached_tables(), 3);
    }

    #[test]
    fn placeholder_grows_in_clamped_steps() {
        let mut ctx = TuningContext::new();
        assert_eq!(ctx.influence_placeholder(10).len(), 1000);
        assert_eq!(ctx.influence_size(), DUMMY_G_MIN_SIZE);
        assert!(ctx.influence_placeholder(16).iter().all(|&g| g == 1.0));
        assert_eq!(ctx.influence_size(), DUMMY_G_MIN_SIZE);

        ctx.influence_placeholder(40);
        assert_eq!(ctx.influence_size(), 42);
        ctx.influence_placeholder(45);
        assert_eq!(ctx.influence_size(), 52);
        assert_eq!(ctx.influence_placeholder(45).len(), 45 * 45 * 45);
        ctx.influence_placeholder(70);
        assert_eq!(ctx.influence_size(), 70);
    }

    #[test]
    fn assigners_share_the_context_table() {
        let mut ctx = TuningContext::with_resolution(64).unwrap();
        let config = AssignConfig { order: 2, mesh: 8, ..AssignConfig::default() };
        let first = ctx.assigner(config.clone()).unwrap();
        let second = ctx.assigner(config).unwrap();
        assert!(Arc::ptr_eq(first.table(), second.table()));
        assert_eq!(first.config().max_interpol, 64);
        assert_eq!(ctx.cached_tables(), 1);
    }
}
