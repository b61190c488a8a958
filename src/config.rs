//! Runtime configuration.
//!
//! Small set of tunables persisted next to the event table. Values are
//! range-checked before persisting — invalid settings are rejected, not
//! clamped. The stored form is a length-prefixed postcard blob; an erased
//! region (`0xFF`) or a corrupt blob falls back to defaults.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::error::{Error, Result};

/// Start of the config region in persistent storage. The event table owns
/// `0..EVENT_TABLE_LEN` (see [`crate::scheduler`]); the config blob lives
/// well clear of it.
pub const CONFIG_OFFSET: usize = 32;

/// Reserved size of the config region: one length byte plus the blob.
pub const CONFIG_REGION_LEN: usize = 32;

/// Core system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Beep on startup for this many milliseconds (0 = silent boot).
    pub startup_beep_ms: u16,
    /// Echo each completed command line back before executing it, for
    /// terminals without local echo.
    pub echo_input: bool,
    /// Evaluate the event table at boot and drive the outputs to the state
    /// they should currently be in.
    pub sync_outputs_on_boot: bool,
    /// Upper bound accepted by the `beep` command.
    pub max_beep_ms: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            startup_beep_ms: 100,
            echo_input: true,
            sync_outputs_on_boot: true,
            max_beep_ms: 10_000,
        }
    }
}

/// Reject configurations the hardware cannot honour.
pub fn validate(cfg: &SystemConfig) -> Result<()> {
    if cfg.max_beep_ms == 0 || cfg.max_beep_ms > 60_000 {
        return Err(Error::Config("max_beep_ms must be 1–60000"));
    }
    if cfg.startup_beep_ms > cfg.max_beep_ms {
        return Err(Error::Config("startup_beep_ms must be <= max_beep_ms"));
    }
    Ok(())
}

/// Load the stored configuration, falling back to defaults when the region
/// is erased or the blob does not decode. Only a storage I/O failure is an
/// error.
pub fn load(storage: &dyn StoragePort) -> Result<SystemConfig> {
    let mut len_byte = [0u8; 1];
    storage.read(CONFIG_OFFSET, &mut len_byte)?;

    let len = usize::from(len_byte[0]);
    if len_byte[0] == 0xFF {
        info!("config: region erased, using defaults");
        return Ok(SystemConfig::default());
    }
    if len == 0 || len > CONFIG_REGION_LEN - 1 {
        warn!("config: implausible blob length {len}, using defaults");
        return Ok(SystemConfig::default());
    }

    let mut blob = [0u8; CONFIG_REGION_LEN - 1];
    storage.read(CONFIG_OFFSET + 1, &mut blob[..len])?;

    match postcard::from_bytes::<SystemConfig>(&blob[..len]) {
        Ok(cfg) if validate(&cfg).is_ok() => {
            info!("config: loaded {len}-byte blob");
            Ok(cfg)
        }
        Ok(_) => {
            warn!("config: stored values out of range, using defaults");
            Ok(SystemConfig::default())
        }
        Err(_) => {
            warn!("config: blob corrupt, using defaults");
            Ok(SystemConfig::default())
        }
    }
}

/// Validate and persist the configuration.
pub fn save(cfg: &SystemConfig, storage: &mut dyn StoragePort) -> Result<()> {
    validate(cfg)?;

    let blob = postcard::to_allocvec(cfg).map_err(|_| Error::Config("serialization failed"))?;
    if blob.len() > CONFIG_REGION_LEN - 1 {
        return Err(Error::Config("blob exceeds config region"));
    }

    storage.write(CONFIG_OFFSET, &[blob.len() as u8])?;
    storage.write(CONFIG_OFFSET + 1, &blob)?;
    info!("config: saved {}-byte blob", blob.len());
    Ok(())
}
