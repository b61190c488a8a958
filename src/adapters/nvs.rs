//! Non-volatile storage adapter.
//!
//! Presents the byte-addressable [`StoragePort`] region that holds the
//! event table and the config blob. Erased bytes read `0xFF`, matching
//! what the domain layer's sentinels expect.
//!
//! - **`target_os = "espidf"`** — the region is mirrored in RAM and backed
//!   by a single NVS blob; every write commits the whole region (NVS blob
//!   commits are atomic, so no partial write survives a power loss).
//! - **`not(target_os = "espidf")`** — RAM only, for the host test suite.

use crate::app::ports::{StorageError, StoragePort};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Usable region size. The event table and config blob use the first 64
/// bytes; the rest is headroom for future persisted state.
pub const STORAGE_SIZE: usize = 256;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &[u8] = b"outtimer\0";
#[cfg(target_os = "espidf")]
const NVS_KEY: &[u8] = b"region\0";

/// The storage region, with its RAM mirror.
pub struct NvsStorage {
    region: [u8; STORAGE_SIZE],
}

#[cfg(not(target_os = "espidf"))]
impl NvsStorage {
    /// Fresh, fully erased region.
    pub fn new() -> Self {
        Self {
            region: [0xFF; STORAGE_SIZE],
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl NvsStorage {
    /// Initialise NVS flash and load the region blob (erased if absent).
    ///
    /// On first boot or after an NVS version mismatch the partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase run from the single
        // main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::Io);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::Io);
        }

        let mut region = [0xFFu8; STORAGE_SIZE];
        let loaded = Self::with_handle(false, |handle| {
            let mut size = STORAGE_SIZE;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    region.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret == ESP_ERR_NVS_NOT_FOUND {
                return Err(ret);
            }
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });

        match loaded {
            Ok(size) => info!("NvsStorage: loaded {size}-byte region"),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                info!("NvsStorage: no stored region, starting erased");
                region = [0xFF; STORAGE_SIZE];
            }
            Err(e) => {
                warn!("NvsStorage: read error {e}, starting erased");
                region = [0xFF; STORAGE_SIZE];
            }
        }
        Ok(Self { region })
    }

    /// Open the namespace, run a closure with the handle, close it again.
    fn with_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// Push the whole RAM mirror into the blob and commit.
    fn commit(&self) -> Result<(), StorageError> {
        let result = Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    self.region.as_ptr() as *const _,
                    STORAGE_SIZE,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsStorage: commit failed ({e})");
            StorageError::Io
        })
    }
}

impl StoragePort for NvsStorage {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let end = offset.checked_add(buf.len()).ok_or(StorageError::OutOfBounds)?;
        if end > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        buf.copy_from_slice(&self.region[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let end = offset.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        if end > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        self.region[offset..end].copy_from_slice(data);
        #[cfg(target_os = "espidf")]
        self.commit()?;
        Ok(())
    }

    fn capacity(&self) -> usize {
        STORAGE_SIZE
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn fresh_region_reads_erased() {
        let storage = NvsStorage::new();
        let mut buf = [0u8; 16];
        storage.read(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xFF));
        assert_eq!(storage.capacity(), STORAGE_SIZE);
    }

    #[test]
    fn write_read_round_trip() {
        let mut storage = NvsStorage::new();
        storage.write(10, &[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 4];
        storage.read(10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        // Neighbouring bytes stay erased.
        let mut edge = [0u8; 1];
        storage.read(9, &mut edge).unwrap();
        assert_eq!(edge[0], 0xFF);
        storage.read(14, &mut edge).unwrap();
        assert_eq!(edge[0], 0xFF);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut storage = NvsStorage::new();
        let mut buf = [0u8; 8];
        assert_eq!(
            storage.read(STORAGE_SIZE - 4, &mut buf),
            Err(StorageError::OutOfBounds)
        );
        assert_eq!(
            storage.write(STORAGE_SIZE, &[0]),
            Err(StorageError::OutOfBounds)
        );
        assert_eq!(
            storage.write(usize::MAX, &[0]),
            Err(StorageError::OutOfBounds)
        );
    }
}
