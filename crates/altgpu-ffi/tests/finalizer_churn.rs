//! A host that only ever runs the finalizer must not grow the handle table.

use altgpu_ffi::lifecycle::{altgpu_init, altgpu_live_handles};
use altgpu_ffi::vector::{altgpu_real_create, altgpu_real_dispose, altgpu_real_elt};
use altgpu_ffi::{AltgpuElementKind, AltgpuStatus};

const OK: i32 = AltgpuStatus::Ok as i32;

fn live_reals() -> usize {
    let mut count = usize::MAX;
    assert_eq!(
        altgpu_live_handles(AltgpuElementKind::Real as i32, &mut count),
        OK
    );
    count
}

#[test]
fn create_dispose_loop_keeps_live_count_flat() {
    assert_eq!(altgpu_init(), OK);
    assert_eq!(live_reals(), 0);

    let mut handles = Vec::new();
    for _ in 0..1000 {
        let mut h = 0u64;
        assert_eq!(altgpu_real_create(8, &mut h), OK);
        assert_eq!(live_reals(), 1);
        assert_eq!(altgpu_real_dispose(h), OK);
        assert_eq!(live_reals(), 0);
        handles.push(h);
    }

    // Slots are recycled, so later handles reuse earlier indices.
    let slots: std::collections::HashSet<u64> = handles.iter().map(|h| h >> 32).collect();
    assert!(slots.len() < 100, "{} distinct slots", slots.len());

    let last = *handles.last().unwrap();
    let mut value = 0.0;
    assert_eq!(
        altgpu_real_elt(last, 0, &mut value),
        AltgpuStatus::Freed as i32
    );
}
