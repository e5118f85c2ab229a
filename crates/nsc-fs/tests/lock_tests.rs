use nsc_fs::{Error, RunLock};
use tempfile::TempDir;

#[test]
fn test_second_lock_fails_while_first_is_held() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".nsc.lock");

    let first = RunLock::acquire(&path).unwrap();
    let second = RunLock::acquire(&path);

    assert!(matches!(second, Err(Error::LockFailed { .. })));
    assert_eq!(first.path(), path.as_path());
}

#[test]
fn test_lock_is_released_on_drop() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state/.nsc.lock");

    {
        let _held = RunLock::acquire(&path).unwrap();
    }

    assert!(RunLock::acquire(&path).is_ok());
}
