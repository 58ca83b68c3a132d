//! Shared-memory sample source.
//!
//! The capture service publishes its most recent amplitudes in a POSIX shared-memory
//! object as a flat array of native-endian `i16`. The region is mapped read-only and
//! copied out in full on every poll. There is no coordination with the writer, so a
//! snapshot may mix old and new values; that is the expected behavior of a live view
//! and is not reported as an error.
//!
//! The region size is read once at open and assumed fixed afterwards.

use super::SampleSource;
use std::time::Duration;

/// Pause between snapshots, bounds CPU use of the polling loop.
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(10);

/// Read-only view of a shared-memory region of `i16` samples.
pub struct MemorySource {
    name: String,
    region: Option<Region>,
}

impl MemorySource {
    /// Opens and maps the named shared-memory object.
    ///
    /// # Errors
    /// - If the object does not exist or cannot be opened read-only
    /// - If it is too small to hold a single sample
    /// - If mapping fails
    pub fn open(name: &str) -> anyhow::Result<Self> {
        let region = Region::open(name)?;
        tracing::info!(
            "Shared memory {} mapped: {} bytes ({} samples)",
            name,
            region.len,
            region.sample_count()
        );
        Ok(Self {
            name: name.to_string(),
            region: Some(region),
        })
    }

    /// Copies every sample currently in the region, starting at offset 0.
    pub fn snapshot(&self) -> Vec<i16> {
        self.region
            .as_ref()
            .map(Region::snapshot)
            .unwrap_or_default()
    }
}

impl SampleSource for MemorySource {
    fn poll(&mut self) -> Vec<i16> {
        self.snapshot()
    }

    fn idle_interval(&self) -> Duration {
        SNAPSHOT_INTERVAL
    }

    fn close(&mut self) {
        if let Some(region) = self.region.take() {
            drop(region);
            tracing::debug!("Shared memory {} released", self.name);
        }
    }
}

impl Drop for MemorySource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(target_os = "linux")]
struct Region {
    fd: libc::c_int,
    addr: *mut libc::c_void,
    len: usize,
}

#[cfg(target_os = "linux")]
impl Region {
    fn open(name: &str) -> anyhow::Result<Self> {
        use anyhow::anyhow;
        use std::ffi::CString;
        use std::io;

        let c_name = CString::new(name)
            .map_err(|_| anyhow!("Invalid shared memory name '{name}'"))?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDONLY, 0) };
        if fd == -1 {
            let err = io::Error::last_os_error();
            return Err(anyhow!(
                "Failed to open shared memory '{name}': {err}. Is the capture service running?"
            ));
        }

        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } == -1 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(anyhow!("Failed to stat shared memory '{name}': {err}"));
        }

        let len = stat.st_size as usize;
        if len < std::mem::size_of::<i16>() {
            unsafe { libc::close(fd) };
            return Err(anyhow!(
                "Shared memory '{name}' is {len} bytes, too small to hold any samples"
            ));
        }

        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(anyhow!("Failed to map shared memory '{name}': {err}"));
        }

        Ok(Self { fd, addr, len })
    }

    fn sample_count(&self) -> usize {
        self.len / std::mem::size_of::<i16>()
    }

    fn snapshot(&self) -> Vec<i16> {
        let base = self.addr as *const i16;
        // The writer may change any value mid-copy, so no reference to the mapping is
        // ever formed; each element is read individually.
        (0..self.sample_count())
            .map(|i| unsafe { std::ptr::read_volatile(base.add(i)) })
            .collect()
    }
}

#[cfg(target_os = "linux")]
impl Drop for Region {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.addr, self.len);
            libc::close(self.fd);
        }
    }
}

#[cfg(not(target_os = "linux"))]
struct Region {
    len: usize,
}

#[cfg(not(target_os = "linux"))]
impl Region {
    fn open(name: &str) -> anyhow::Result<Self> {
        Err(anyhow::anyhow!(
            "Shared memory source '{name}' is only supported on Linux"
        ))
    }

    fn sample_count(&self) -> usize {
        self.len / std::mem::size_of::<i16>()
    }

    fn snapshot(&self) -> Vec<i16> {
        Vec::new()
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::ffi::CString;

    /// Writable shared-memory object standing in for the capture service.
    struct Writer {
        name: CString,
        fd: libc::c_int,
        addr: *mut libc::c_void,
        len: usize,
    }

    impl Writer {
        fn create(name: &str, len: usize) -> Self {
            let name = CString::new(name).unwrap();
            unsafe {
                let fd = libc::shm_open(
                    name.as_ptr(),
                    libc::O_CREAT | libc::O_RDWR | libc::O_TRUNC,
                    0o600,
                );
                assert!(fd != -1, "shm_open failed");
                assert_eq!(libc::ftruncate(fd, len as libc::off_t), 0);
                let addr = libc::mmap(
                    std::ptr::null_mut(),
                    len,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    fd,
                    0,
                );
                assert!(addr != libc::MAP_FAILED, "mmap failed");
                Self { name, fd, addr, len }
            }
        }

        fn write(&self, values: &[i16]) {
            assert!(values.len() * 2 <= self.len);
            unsafe {
                std::ptr::copy_nonoverlapping(
                    values.as_ptr(),
                    self.addr as *mut i16,
                    values.len(),
                );
            }
        }
    }

    impl Drop for Writer {
        fn drop(&mut self) {
            unsafe {
                libc::munmap(self.addr, self.len);
                libc::close(self.fd);
                libc::shm_unlink(self.name.as_ptr());
            }
        }
    }

    fn unique_name(tag: &str) -> String {
        format!("/levelscope_test_{}_{}", tag, std::process::id())
    }

    #[test]
    fn test_poll_returns_whole_region_in_order() {
        let name = unique_name("order");
        let writer = Writer::create(&name, 6);
        writer.write(&[10, -20, 30]);

        let mut source = MemorySource::open(&name).unwrap();
        assert_eq!(source.poll(), vec![10, -20, 30]);
    }

    #[test]
    fn test_poll_sees_writer_updates() {
        let name = unique_name("live");
        let writer = Writer::create(&name, 4);
        writer.write(&[1, 2]);

        let mut source = MemorySource::open(&name).unwrap();
        assert_eq!(source.poll(), vec![1, 2]);

        writer.write(&[-32768, 32767]);
        assert_eq!(source.poll(), vec![-32768, 32767]);
    }

    #[test]
    fn test_odd_trailing_byte_is_ignored() {
        let name = unique_name("odd");
        let writer = Writer::create(&name, 7);
        writer.write(&[5, 6, 7]);

        let mut source = MemorySource::open(&name).unwrap();
        assert_eq!(source.poll().len(), 3);
    }

    #[test]
    fn test_missing_region_fails_to_open() {
        let result = MemorySource::open(&unique_name("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let name = unique_name("close");
        let _writer = Writer::create(&name, 2);

        let mut source = MemorySource::open(&name).unwrap();
        source.close();
        source.close();
        assert!(source.poll().is_empty());
    }

    #[test]
    fn test_memory_source_idles_between_polls() {
        let name = unique_name("idle");
        let _writer = Writer::create(&name, 2);

        let source = MemorySource::open(&name).unwrap();
        assert_eq!(source.idle_interval(), Duration::from_millis(10));
    }
}
