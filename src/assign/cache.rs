use glam::DVec3;

/// Per-particle stencil data kept between an assignment pass and the
/// back-interpolation that reads the same mesh state.
///
/// Weight fractions already include the particle charge. Derivative weights
/// are stored as one `DVec3` per stencil cell, which replaces the separate
/// per-axis arrays of older layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentCache {
    order: usize,
    stencil_size: usize,
    base: Vec<[usize; 3]>,
    fractions: Vec<f64>,
    derivatives: Option<Vec<DVec3>>,
}

impl AssignmentCache {
    pub fn new(order: usize) -> Self {
        Self { order, stencil_size: order * order * order, base: Vec::new(),
               fractions: Vec::new(), derivatives: None }
    }

    /// Sizes the cache for `num_particles`. Contents are stale until the next
    /// assignment pass overwrites them.
    pub fn prepare(&mut self, num_particles: usize, with_derivatives: bool) {
        self.base.resize(num_particles, [0; 3]);
        self.fractions.resize(num_particles * self.stencil_size, 0.0);
        if with_derivatives {
            self.derivatives.get_or_insert_with(Vec::new)
                .resize(num_particles * self.stencil_size, DVec3::ZERO);
        } else {
            self.derivatives = None;
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Cells per particle, `order^3`.
    pub fn stencil_size(&self) -> usize {
        self.stencil_size
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn has_derivatives(&self) -> bool {
        self.derivatives.is_some()
    }

    pub fn base(&self, particle: usize) -> [usize; 3] {
        self.base[particle]
    }

    pub fn fractions(&self, particle: usize) -> &[f64] {
        let n = self.stencil_size;
        &self.fractions[particle * n..(particle + 1) * n]
    }

    pub fn derivatives(&self, particle: usize) -> Option<&[DVec3]> {
        let n = self.stencil_size;
        self.derivatives.as_ref().map(|d| &d[particle * n..(particle + 1) * n])
    }

    pub(crate) fn bases(&self) -> &[[usize; 3]] {
        &self.base
    }

    pub(crate) fn all_fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub(crate) fn all_derivatives(&self) -> Option<&[DVec3]> {
        self.derivatives.as_deref()
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [[usize; 3]], &mut [f64], Option<&mut [DVec3]>) {
        (&mut self.base, &mut self.fractions, self.derivatives.as_deref_mut())
    }
}
