pub mod types;

use std::path::Path;

use crate::error::{HotelError, Result};
use types::Config;

/// Load `config.yaml`, falling back to defaults when the file is absent.
///
/// A relative `store.data_path` is taken relative to the config file, so
/// the server finds its dataset regardless of the working directory.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Config::default(),
        Ok(content) => serde_yml::from_str::<Config>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(HotelError::Config(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    if let (Some(data_path), Some(dir)) = (config.store.data_path.as_mut(), path.parent())
        && data_path.is_relative()
    {
        *data_path = dir.join(&*data_path);
    }

    config.validate()?;
    tracing::debug!(path = %path.display(), tenant = %config.tenant.owner_id, "Loaded config");
    Ok(config)
}
