/// Maps a stencil index onto `[0, mesh)` under periodic boundaries.
///
/// Only a single wrap in either direction is performed. A stencil never
/// reaches further than one mesh width past the box as long as
/// `mesh >= order`, so anything outside `[-mesh, 2*mesh)` is a caller bug.
#[inline]
pub fn wrap_mesh_index(ind: isize, mesh: usize) -> usize {
    let m = mesh as isize;
    debug_assert!(ind >= -m && ind < 2 * m,
                  "mesh index ({ind}) more than one period outside [0, {mesh})");
    if ind < 0 {
        (ind + m) as usize
    } else if ind >= m {
        (ind - m) as usize
    } else {
        ind as usize
    }
}
