//! TOML mount profiles: a declarative write dir, symlink policy and mount
//! list applied to an instance in one call.
//!
//! ```toml
//! write_dir = "/var/game/save"
//! permit_symlinks = false
//!
//! [[mount]]
//! source = "/usr/share/game/base"
//!
//! [[mount]]
//! source = "/usr/share/game/textures.pak"
//! mount_point = "gfx"
//! append = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{map_io_error, ErrorCode, Result};
use crate::vfs::Vfs;

/// One search-path entry of a [`Profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Real directory or archive file to mount.
    pub source: String,
    /// Virtual location; the root when omitted.
    #[serde(default)]
    pub mount_point: Option<String>,
    /// Place the mount behind existing ones (the default) instead of in
    /// front of them.
    #[serde(default = "default_append")]
    pub append: bool,
}

fn default_append() -> bool {
    true
}

/// Declarative instance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub write_dir: Option<String>,
    #[serde(default)]
    pub permit_symlinks: bool,
    #[serde(default, rename = "mount")]
    pub mounts: Vec<MountSpec>,
}

impl Profile {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| {
            warn!(%err, "malformed mount profile");
            ErrorCode::Corrupt
        })
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).expect("profiles always serialize")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(map_io_error)?;
        Self::from_toml(&text)
    }
}

impl Vfs {
    /// Apply a profile: symlink policy and write dir first, then the mount
    /// list in order. The first failing step aborts.
    pub async fn apply_profile(&self, profile: &Profile) -> Result<()> {
        self.permit_symbolic_links(profile.permit_symlinks);
        if let Some(dir) = &profile.write_dir {
            self.set_write_dir(Some(dir)).await?;
        }
        for spec in &profile.mounts {
            self.mount(&spec.source, spec.mount_point.as_deref(), spec.append).await?;
        }
        Ok(())
    }
}
