use rayon::{ThreadPool, ThreadPoolBuilder};

/// Upper bound on scan worker threads.
pub const MAX_SCAN_THREADS: usize = 64;

/// Build a dedicated pool for processing the files of a scan cycle
///
/// # Errors
///
/// Returns an error if `num_threads` is zero, exceeds [`MAX_SCAN_THREADS`],
/// or the pool cannot be created
pub fn build_scan_pool(num_threads: usize) -> anyhow::Result<ThreadPool> {
    if num_threads == 0 || num_threads > MAX_SCAN_THREADS {
        anyhow::bail!("Thread count must be between 1 and {MAX_SCAN_THREADS}, got {num_threads}");
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("oxmon-scan-{i}"))
        .build()?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scan_pool() {
        let pool = build_scan_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert_eq!(pool.install(|| 40 + 2), 42);
    }

    #[test]
    fn test_rejects_bad_thread_counts() {
        assert!(build_scan_pool(0).is_err());
        assert!(build_scan_pool(MAX_SCAN_THREADS + 1).is_err());
    }
}
