use super::*;

#[test]
fn host_mirror_only_sees_writes_after_copy() {
    let mut m = HostMemory::<f32>::new("test");
    m.alloc(4).unwrap();
    m.device_mut().unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(m.host(), &[0.0; 4]);

    m.copy_to_host(0, 2, 2).unwrap();
    assert_eq!(m.host(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn partial_copy_leaves_remaining_rows_untouched() {
    let mut m = HostMemory::<f32>::new("test");
    m.alloc(6).unwrap();
    m.device_mut().unwrap().fill(5.0);
    m.copy_to_host(2, 2, 1).unwrap();
    assert_eq!(m.host(), &[0.0, 0.0, 5.0, 5.0, 0.0, 0.0]);
}

#[test]
fn zero_clears_device_side() {
    let mut m = HostMemory::<f32>::new("test");
    m.alloc(3).unwrap();
    m.device_mut().unwrap().fill(9.0);
    m.zero().unwrap();
    m.copy_to_host(0, 3, 1).unwrap();
    assert_eq!(m.host(), &[0.0; 3]);
}

#[test]
fn copy_out_of_range_is_a_device_error() {
    let mut m = HostMemory::<f32>::new("test");
    m.alloc(4).unwrap();
    let err = m.copy_to_host(0, 3, 2).unwrap_err();
    assert!(matches!(err, LumenError::Device(_)));
}

#[test]
fn unallocated_memory_reports_empty() {
    let mut m = HostMemory::<u8>::new("test");
    assert!(!m.is_allocated());
    assert_eq!(m.len(), 0);
    assert!(m.zero().is_ok());
    assert!(m.copy_to_host(0, 1, 1).is_err());

    m.alloc(2).unwrap();
    assert!(m.is_allocated());
    m.free();
    assert!(!m.is_allocated());
    assert!(m.host().is_empty());
}
