//! I/O 支持：JSON、RON、TOML 序列化接口（检查点与运行配置）。
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ron::ser::PrettyConfig;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported file extension: {0}")]
    Extension(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn from_toml_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(toml::from_str(s)?)
}

/// Writes `value` as JSON or RON, chosen by the file extension.
pub fn write_path<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let content = match extension(path.as_ref()).as_str() {
        "json" => to_json_string(value)?,
        "ron" => to_ron_string(value)?,
        other => return Err(IoError::Extension(other.to_string())),
    };
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Reads JSON, RON or TOML, chosen by the file extension.
pub fn read_path<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let ext = extension(path.as_ref());
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    match ext.as_str() {
        "json" => from_json_str(&content),
        "ron" => from_ron_str(&content),
        "toml" => from_toml_str(&content),
        other => Err(IoError::Extension(other.to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
