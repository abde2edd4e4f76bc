//! Framed binary serialization for persisted parameters.
//!
//! Every blob starts with an 8-byte magic tag and a little-endian `u32` format
//! version, followed by the bincode payload. The header lets a loader reject
//! foreign files and files written by a newer format before bincode sees them.

use crate::error::ForecastError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Magic tag at the start of every persisted blob.
pub const MAGIC: [u8; 8] = *b"FOODCAST";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = MAGIC.len() + 4;

/// Parameter representations that can be serialized to and from bytes.
///
/// Implemented for every serde type; implementors should hold plain data
/// only (vectors, scalars, strings).
pub trait SerializableParams: Sized {
    /// Serialize into a framed byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, ForecastError>;

    /// Deserialize from a framed byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ForecastError>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self) -> Result<Vec<u8>, ForecastError> {
        let payload = bincode::serialize(self)?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ForecastError> {
        let payload = strip_header(bytes)?;
        Ok(bincode::deserialize(payload)?)
    }
}

/// Read the format version from a framed blob without decoding the payload.
pub fn format_version(bytes: &[u8]) -> Result<u32, ForecastError> {
    if bytes.len() < HEADER_LEN {
        return Err(ForecastError::Serialization(format!(
            "file is too short to be a model artifact ({} bytes)",
            bytes.len()
        )));
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(ForecastError::Serialization(
            "missing artifact magic tag; not a foodcast model file".to_string(),
        ));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    Ok(u32::from_le_bytes(version))
}

fn strip_header(bytes: &[u8]) -> Result<&[u8], ForecastError> {
    let version = format_version(bytes)?;
    if version == 0 || version > FORMAT_VERSION {
        return Err(ForecastError::Serialization(format!(
            "unsupported artifact format version {} (this build reads up to {})",
            version, FORMAT_VERSION
        )));
    }
    Ok(&bytes[HEADER_LEN..])
}
