//! # Config Loader
//!
//! Reads the dataset configuration into a validated [`DatasetBlueprint`].
//!
//! A blueprint returned from here has passed every rule in [`validator`],
//! so callers expand it into per-session configs without checking again.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let blueprint = config_loader::load_blueprint(Path::new("advio.toml")).unwrap();
//! for session in blueprint.sessions() {
//!     println!("{} -> {}", session.session_id, session.outputs.dir.display());
//! }
//! ```

mod parser;
pub mod validator;

pub use contracts::DatasetBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Read, parse and validate the config file at `path`.
///
/// The format follows the extension (`.toml` or `.json`).
pub fn load_blueprint(path: &Path) -> Result<DatasetBlueprint, ContractError> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
        message: format!("cannot read '{}'", path.display()),
        source: Some(Box::new(e)),
    })?;
    parse_blueprint(&content, format)
}

/// Parse and validate config text already in memory
pub fn parse_blueprint(
    content: &str,
    format: ConfigFormat,
) -> Result<DatasetBlueprint, ContractError> {
    let blueprint = parser::parse(content, format)?;
    validator::validate(&blueprint)?;
    Ok(blueprint)
}
