//! The JSON config blob exchanged as the payload following the P0
//! packet (spec §6): `{size, name, split, encoding, key_size}`,
//! serialized without extra whitespace.

use crate::config::{SessionParams, TextEncoding};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBlob {
    pub size: u32,
    pub name: String,
    pub split: char,
    pub encoding: String,
    pub key_size: u32,
}

impl ConfigBlob {
    pub fn from_params(params: &SessionParams) -> Result<Self> {
        if !params.split.is_ascii() {
            return Err(Error::InvalidEncoding(format!(
                "split delimiter byte {:#x} is not ASCII",
                params.split
            )));
        }
        Ok(Self {
            size: params.frame_size,
            name: params.proto_name.clone(),
            split: params.split as char,
            encoding: params.text_encoding.as_name().to_string(),
            key_size: params.key_size,
        })
    }

    pub fn to_params(&self) -> Result<SessionParams> {
        if !self.split.is_ascii() {
            return Err(Error::InvalidEncoding(format!(
                "split delimiter {:?} is not ASCII",
                self.split
            )));
        }
        let params = SessionParams {
            frame_size: self.size,
            proto_name: self.name.clone(),
            split: self.split as u8,
            text_encoding: TextEncoding::from_name(&self.encoding)?,
            key_size: self.key_size,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_extra_whitespace() {
        let params = SessionParams {
            frame_size: 1000,
            proto_name: "mps".to_string(),
            split: b'$',
            text_encoding: TextEncoding::Utf8,
            key_size: 512,
        };
        let blob = ConfigBlob::from_params(&params).unwrap();
        let json = serde_json::to_string(&blob).unwrap();
        assert!(!json.contains(' '));
        assert!(json.contains("\"key_size\":512"));
    }

    #[test]
    fn roundtrips_through_json() {
        let params = SessionParams {
            frame_size: 128,
            proto_name: "mps".to_string(),
            split: b'$',
            text_encoding: TextEncoding::Utf8,
            key_size: 1024,
        };
        let blob = ConfigBlob::from_params(&params).unwrap();
        let json = serde_json::to_vec(&blob).unwrap();
        let parsed: ConfigBlob = serde_json::from_slice(&json).unwrap();
        let roundtripped = parsed.to_params().unwrap();
        assert_eq!(roundtripped, params);
    }
}
