#![allow(unused_macros)]

/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut failures = lock!(self.failures);
///  failures.push(failure);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}
