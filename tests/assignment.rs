mod common;

use glam::DVec3;

use p3m_charge_assign::assign::{assign_charges, assign_charges_and_derivatives,
                                assign_charges_uncached, assign_squared_charges,
                                gather_scalar_uncached, kernel_for, GenericKernel};
use p3m_charge_assign::constants::{MAX_ORDER, MIN_ORDER};
use p3m_charge_assign::{AssignmentCache, ComplexMesh, InterpolationTable, MeshGeometry, MeshPass,
                        MeshSlot, ParticleSystem};

use common::random_system;

#[test]
fn charge_is_conserved_for_every_order() {
    let particles = random_system(400, 7.3, 11);
    let total = particles.total_charge();
    let scale: f64 = particles.charges().iter().map(|q| q.abs()).sum();
    let geometry = MeshGeometry::init(12, 7.3).unwrap();

    for order in MIN_ORDER..=MAX_ORDER {
        let table = InterpolationTable::shared(order, false).unwrap();
        for shift in [0.0, 0.5] {
            let pass = MeshPass::new(kernel_for(order).unwrap(), &geometry, &table).unwrap()
                .with_shift(shift);
            let mut mesh = ComplexMesh::init(12);
            let mut cache = AssignmentCache::new(order);
            assign_charges(&pass, &particles, &mut mesh, &mut cache).unwrap();
            let err = (mesh.sum(MeshSlot::Real) - total).abs();
            assert!(err < 1e-12 * scale, "order {order} shift {shift}: error {err}");
            assert_eq!(mesh.sum(MeshSlot::Imaginary), 0.0);
        }
    }
}

#[test]
fn third_order_particle_on_a_mesh_point() {
    let geometry = MeshGeometry::init(8, 8.0).unwrap();
    let table = InterpolationTable::build(3, false).unwrap();
    let pass = MeshPass::new(kernel_for(3).unwrap(), &geometry, &table).unwrap();
    let particles = ParticleSystem::from_parts(8.0, vec![DVec3::splat(4.0)], vec![1.0]).unwrap();

    let mut mesh = ComplexMesh::init(8);
    let mut cache = AssignmentCache::new(3);
    assign_charges(&pass, &particles, &mut mesh, &mut cache).unwrap();

    let w = [1.0 / 8.0, 6.0 / 8.0, 1.0 / 8.0];
    let mut touched = 0;
    for i in 0..8 {
        for j in 0..8 {
            for k in 0..8 {
                let v = mesh.get(i, j, k, MeshSlot::Real);
                let inside = |x: usize| (3..=5).contains(&x);
                if inside(i) && inside(j) && inside(k) {
                    let expected = w[i - 3] * w[j - 3] * w[k - 3];
                    assert!((v - expected).abs() < 1e-15, "({i},{j},{k}): {v}");
                    touched += 1;
                } else {
                    assert_eq!(v, 0.0, "({i},{j},{k})");
                }
            }
        }
    }
    assert_eq!(touched, 27);
    assert!((mesh.sum(MeshSlot::Real) - 1.0).abs() < 1e-15);
    assert_eq!(cache.base(0), [3, 3, 3]);
    assert!((cache.fractions(0)[13] - 0.421875).abs() < 1e-15);
}

#[test]
fn specialised_paths_match_the_generic_reference() {
    let particles = random_system(150, 5.0, 3);
    let geometry = MeshGeometry::init(9, 5.0).unwrap();

    for order in MIN_ORDER..=MAX_ORDER {
        let table = InterpolationTable::with_resolution(order, true, 512).unwrap();
        let generic = GenericKernel::new(order).unwrap();
        for shift in [0.0, 0.5] {
            let fast = MeshPass::new(kernel_for(order).unwrap(), &geometry, &table).unwrap()
                .with_shift(shift);
            let reference = MeshPass::new(&generic, &geometry, &table).unwrap().with_shift(shift);

            let (mut mesh_a, mut mesh_b) = (ComplexMesh::init(9), ComplexMesh::init(9));
            let (mut cache_a, mut cache_b) = (AssignmentCache::new(order), AssignmentCache::new(order));
            assign_charges_and_derivatives(&fast, &particles, &mut mesh_a, &mut cache_a).unwrap();
            assign_charges_and_derivatives(&reference, &particles, &mut mesh_b, &mut cache_b).unwrap();
            assert_eq!(mesh_a, mesh_b, "order {order} shift {shift}: meshes differ");
            assert_eq!(cache_a, cache_b, "order {order} shift {shift}: caches differ");

            assert_eq!(gather_scalar_uncached(&fast, &particles, &mesh_a).unwrap(),
                       gather_scalar_uncached(&reference, &particles, &mesh_b).unwrap());
        }
    }
}

#[test]
fn parallel_assignment_matches_serial() {
    let particles = random_system(5000, 6.0, 21);
    let geometry = MeshGeometry::init(16, 6.0).unwrap();
    for order in [1, 4, 7] {
        let table = InterpolationTable::shared(order, true).unwrap();
        let serial = MeshPass::new(kernel_for(order).unwrap(), &geometry, &table).unwrap()
            .with_shift(0.5);
        let parallel = serial.with_parallel(true);

        let (mut mesh_s, mut mesh_p) = (ComplexMesh::init(16), ComplexMesh::init(16));
        let (mut cache_s, mut cache_p) = (AssignmentCache::new(order), AssignmentCache::new(order));
        assign_charges_and_derivatives(&serial, &particles, &mut mesh_s, &mut cache_s).unwrap();
        assign_charges_and_derivatives(&parallel, &particles, &mut mesh_p, &mut cache_p).unwrap();

        assert_eq!(cache_s, cache_p, "order {order}");
        for (a, b) in mesh_s.data().iter().zip(mesh_p.data()) {
            assert!((a - b).abs() < 1e-11, "order {order}: {a} vs {b}");
        }

        let mut plain_p = ComplexMesh::init(16);
        assign_charges_uncached(&parallel, &particles, &mut plain_p).unwrap();
        assert!((plain_p.sum(MeshSlot::Real) - particles.total_charge()).abs() < 1e-9);

        assert_eq!(gather_scalar_uncached(&serial, &particles, &mesh_s).unwrap(),
                   gather_scalar_uncached(&parallel, &particles, &mesh_s).unwrap());
    }
}

#[test]
fn assignment_adds_to_existing_mesh_content() {
    let particles = random_system(50, 4.0, 5);
    let geometry = MeshGeometry::init(8, 4.0).unwrap();
    let table = InterpolationTable::shared(2, false).unwrap();
    let pass = MeshPass::new(kernel_for(2).unwrap(), &geometry, &table).unwrap();

    let mut mesh = ComplexMesh::init(8);
    mesh.set_all(1.0);
    assign_charges_uncached(&pass, &particles, &mut mesh).unwrap();
    assert!((mesh.sum(MeshSlot::Real) - 512.0 - particles.total_charge()).abs() < 1e-10);
    assert_eq!(mesh.sum(MeshSlot::Imaginary), 512.0);
}

#[test]
fn squared_charges_match_a_system_of_squared_charges() {
    let particles = random_system(200, 3.0, 8);
    let squared = ParticleSystem::from_parts(3.0, particles.positions().to_vec(),
                                             particles.squared_charges()).unwrap();
    let geometry = MeshGeometry::init(10, 3.0).unwrap();
    let table = InterpolationTable::shared(5, false).unwrap();
    let pass = MeshPass::new(kernel_for(5).unwrap(), &geometry, &table).unwrap();

    let (mut a, mut b) = (ComplexMesh::init(10), ComplexMesh::init(10));
    assign_squared_charges(&pass, &particles, &mut a).unwrap();
    assign_charges_uncached(&pass, &squared, &mut b).unwrap();
    assert_eq!(a, b);
    assert!((a.sum(MeshSlot::Real) - particles.sum_squared_charges()).abs() < 1e-10);
}

#[test]
fn scalar_gather_reads_back_the_assignment_weights() {
    let geometry = MeshGeometry::init(8, 8.0).unwrap();
    for order in MIN_ORDER..=MAX_ORDER {
        let table = InterpolationTable::shared(order, false).unwrap();
        let pass = MeshPass::new(kernel_for(order).unwrap(), &geometry, &table).unwrap();
        let particles = ParticleSystem::from_parts(8.0, vec![DVec3::new(2.3, 5.1, 7.7)],
                                                   vec![1.0]).unwrap();
        let mut mesh = ComplexMesh::init(8);
        assign_charges_uncached(&pass, &particles, &mut mesh).unwrap();

        // sum_c w_c^2 either way
        let direct: f64 = mesh.slot_values(MeshSlot::Real).map(|w| w * w).sum();
        let gathered = gather_scalar_uncached(&pass, &particles, &mesh).unwrap()[0];
        assert!((gathered - direct).abs() < 1e-14, "order {order}: {gathered} vs {direct}");
    }
}
