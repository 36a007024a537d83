//! Engine configuration.
//!
//! Configuration is carried by explicit values handed to [`KeyVault`] and
//! [`Engine`] at construction time. There is no process-wide state.
//!
//! [`KeyVault`]: crate::storage::KeyVault
//! [`Engine`]: crate::engine::Engine

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Default Argon2id memory cost: 64 MiB.
pub const DEFAULT_M_COST_KIB: u32 = 65536;
/// Default Argon2id iterations.
pub const DEFAULT_T_COST: u32 = 3;
/// Default Argon2id parallel lanes.
pub const DEFAULT_P_COST: u32 = 4;

/// Largest memory cost accepted from configuration or a container (1 GiB).
pub const MAX_M_COST_KIB: u32 = 1_048_576;
/// Largest iteration count accepted from configuration or a container.
pub const MAX_T_COST: u32 = 64;
/// Largest lane count accepted from configuration or a container.
pub const MAX_P_COST: u32 = 64;

const ENV_M_COST: &str = "AGENTIC_IDENTITY_KDF_MEMORY_KIB";
const ENV_T_COST: &str = "AGENTIC_IDENTITY_KDF_ITERATIONS";
const ENV_P_COST: &str = "AGENTIC_IDENTITY_KDF_PARALLELISM";

/// Argon2id work factors.
///
/// These are written into every container so that `load` re-derives the
/// key with exactly the parameters used at `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost_kib: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl KdfParams {
    /// Build validated parameters.
    ///
    /// # Errors
    ///
    /// `IdentityError::Validation` if any factor is outside the accepted range.
    pub fn new(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Self {
            m_cost_kib,
            t_cost,
            p_cost,
        };
        params.check().map_err(IdentityError::Validation)?;
        Ok(params)
    }

    /// Check the factors against Argon2's own limits and the engine ceilings.
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if self.p_cost == 0 || self.p_cost > MAX_P_COST {
            return Err(format!("parallelism must be in 1..={MAX_P_COST}"));
        }
        if self.t_cost == 0 || self.t_cost > MAX_T_COST {
            return Err(format!("iterations must be in 1..={MAX_T_COST}"));
        }
        let floor = 8 * self.p_cost;
        if self.m_cost_kib < floor || self.m_cost_kib > MAX_M_COST_KIB {
            return Err(format!(
                "memory cost must be in {floor}..={MAX_M_COST_KIB} KiB for {} lanes",
                self.p_cost
            ));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: DEFAULT_M_COST_KIB,
            t_cost: DEFAULT_T_COST,
            p_cost: DEFAULT_P_COST,
        }
    }
}

/// Configuration for the key vault.
#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
    /// Work factors used when creating new containers.
    pub kdf: KdfParams,
    /// Directory used by [`VaultConfig::identity_path`].
    pub identity_dir: Option<PathBuf>,
}

impl VaultConfig {
    /// Defaults overridden by `AGENTIC_IDENTITY_KDF_*` environment variables.
    ///
    /// # Errors
    ///
    /// `IdentityError::Validation` if a variable is set but unparseable or the
    /// resulting parameters are out of range.
    pub fn from_env() -> Result<Self> {
        let defaults = KdfParams::default();
        let kdf = KdfParams::new(
            env_u32(ENV_M_COST)?.unwrap_or(defaults.m_cost_kib),
            env_u32(ENV_T_COST)?.unwrap_or(defaults.t_cost),
            env_u32(ENV_P_COST)?.unwrap_or(defaults.p_cost),
        )?;
        Ok(Self {
            kdf,
            identity_dir: None,
        })
    }

    /// Replace the KDF work factors.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Use a specific directory for named identities.
    pub fn with_identity_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.identity_dir = Some(dir.into());
        self
    }

    /// Path of the container for a named identity: `<dir>/<name>.aid`.
    ///
    /// # Errors
    ///
    /// `IdentityError::Validation` if `name` is empty or contains a path separator.
    pub fn identity_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(IdentityError::Validation(format!(
                "invalid identity name: {name:?}"
            )));
        }
        let dir = self
            .identity_dir
            .clone()
            .unwrap_or_else(default_identity_dir);
        Ok(dir.join(format!("{name}.aid")))
    }
}

/// Configuration for [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub vault: VaultConfig,
}

impl EngineConfig {
    /// Build from the environment (see [`VaultConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            vault: VaultConfig::from_env()?,
        })
    }
}

/// `$HOME/.agentic/identity`, or `./.agentic/identity` when `HOME` is unset.
pub fn default_identity_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".agentic")
        .join("identity")
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| {
                IdentityError::Validation(format!("{key} must be an integer, got {raw:?}"))
            }),
        Err(_) => Ok(None),
    }
}
