// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Asset model: the native asset or an issued (code, issuer) pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use stellar_xdr::curr as xdr;
use utoipa::ToSchema;

use super::error::CoreError;
use super::keys::{account_id, is_valid_public_key};
use super::types::{HorizonAsset, NATIVE_ASSET_CODE};

/// A Stellar asset. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Issued { code: String, issuer: String },
}

/// Asset as accepted in request bodies. An absent code means the native asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetRequest {
    /// Asset code (`XLM` or absent for the native asset)
    #[serde(default)]
    pub code: Option<String>,
    /// Issuer address, required for issued assets
    #[serde(default)]
    pub issuer: Option<String>,
}

impl AssetRequest {
    pub fn to_asset(&self) -> Result<Asset, CoreError> {
        make_asset(self.code.as_deref(), self.issuer.as_deref())
    }
}

/// Asset as rendered in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetDescriptor {
    /// `native`, `credit_alphanum4`, `credit_alphanum12` or `liquidity_pool_shares`
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

/// Build an asset from an optional code and issuer.
///
/// An absent code, or the native symbol (case-insensitive), yields the native
/// asset and ignores the issuer. Any other code requires a valid issuer.
pub fn make_asset(code: Option<&str>, issuer: Option<&str>) -> Result<Asset, CoreError> {
    let code = match code.map(str::trim) {
        None | Some("") => return Ok(Asset::Native),
        Some(c) if c.eq_ignore_ascii_case(NATIVE_ASSET_CODE) => return Ok(Asset::Native),
        Some(c) => c,
    };

    if code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(CoreError::InvalidAsset(format!(
            "asset code `{code}` must be 1-12 alphanumeric characters"
        )));
    }

    let issuer = issuer.map(str::trim).unwrap_or_default();
    if !is_valid_public_key(issuer) {
        return Err(CoreError::InvalidAsset(format!(
            "asset `{code}` requires a valid issuer address"
        )));
    }

    Ok(Asset::Issued {
        code: code.to_string(),
        issuer: issuer.to_string(),
    })
}

impl Asset {
    /// Code used in records and responses (`XLM` for native).
    pub fn code(&self) -> &str {
        match self {
            Asset::Native => NATIVE_ASSET_CODE,
            Asset::Issued { code, .. } => code,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Native => None,
            Asset::Issued { issuer, .. } => Some(issuer),
        }
    }

    /// Horizon `asset_type` value.
    pub fn horizon_type(&self) -> &'static str {
        match self {
            Asset::Native => "native",
            Asset::Issued { code, .. } if code.len() <= 4 => "credit_alphanum4",
            Asset::Issued { .. } => "credit_alphanum12",
        }
    }

    /// Convert a Horizon asset. `asset_type = "native"` is the native sentinel.
    pub fn from_horizon(asset: &HorizonAsset) -> Result<Self, CoreError> {
        match asset.asset_type.as_str() {
            "native" => Ok(Asset::Native),
            "credit_alphanum4" | "credit_alphanum12" => {
                let code = asset.asset_code.as_deref().ok_or_else(|| {
                    CoreError::InvalidAsset("issued asset without a code".to_string())
                })?;
                make_asset(Some(code), asset.asset_issuer.as_deref())
            }
            other => Err(CoreError::InvalidAsset(format!(
                "unsupported asset type `{other}`"
            ))),
        }
    }

    pub fn descriptor(&self) -> AssetDescriptor {
        AssetDescriptor {
            asset_type: self.horizon_type().to_string(),
            code: Some(self.code().to_string()),
            issuer: self.issuer().map(str::to_string),
        }
    }

    /// XDR form used inside transaction operations.
    pub fn to_xdr(&self) -> Result<xdr::Asset, CoreError> {
        match self {
            Asset::Native => Ok(xdr::Asset::Native),
            Asset::Issued { code, issuer } => {
                let issuer = account_id(issuer)?;
                let bytes = code.as_bytes();
                if bytes.len() <= 4 {
                    let mut asset_code = [0u8; 4];
                    asset_code[..bytes.len()].copy_from_slice(bytes);
                    Ok(xdr::Asset::CreditAlphanum4(xdr::AlphaNum4 {
                        asset_code: xdr::AssetCode4(asset_code),
                        issuer,
                    }))
                } else {
                    let mut asset_code = [0u8; 12];
                    asset_code[..bytes.len()].copy_from_slice(bytes);
                    Ok(xdr::Asset::CreditAlphanum12(xdr::AlphaNum12 {
                        asset_code: xdr::AssetCode12(asset_code),
                        issuer,
                    }))
                }
            }
        }
    }
}

/// `native` or `CODE:ISSUER`, the form Horizon accepts in `source_assets`.
impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Issued { code, issuer } => write!(f, "{code}:{issuer}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    #[test]
    fn absent_or_native_code_is_native() {
        assert_eq!(make_asset(None, None).unwrap(), Asset::Native);
        assert_eq!(make_asset(Some("xlm"), Some("ignored")).unwrap(), Asset::Native);
        assert_eq!(make_asset(Some(""), None).unwrap(), Asset::Native);
    }

    #[test]
    fn issued_asset_requires_valid_issuer() {
        assert!(matches!(
            make_asset(Some("USDC"), None),
            Err(CoreError::InvalidAsset(_))
        ));
        assert!(matches!(
            make_asset(Some("USDC"), Some("GNOTANISSUER")),
            Err(CoreError::InvalidAsset(_))
        ));
        assert!(matches!(
            make_asset(Some("TOOLONGASSETCODE"), Some(ISSUER)),
            Err(CoreError::InvalidAsset(_))
        ));

        let asset = make_asset(Some("USDC"), Some(ISSUER)).unwrap();
        assert_eq!(asset.code(), "USDC");
        assert_eq!(asset.issuer(), Some(ISSUER));
        assert_eq!(asset.to_string(), format!("USDC:{ISSUER}"));
    }

    #[test]
    fn horizon_type_depends_on_code_length() {
        assert_eq!(Asset::Native.horizon_type(), "native");
        assert_eq!(
            make_asset(Some("BRL"), Some(ISSUER)).unwrap().horizon_type(),
            "credit_alphanum4"
        );
        assert_eq!(
            make_asset(Some("BRLTOKEN"), Some(ISSUER)).unwrap().horizon_type(),
            "credit_alphanum12"
        );
    }

    #[test]
    fn from_horizon_maps_native_sentinel() {
        let native = HorizonAsset {
            asset_type: "native".to_string(),
            asset_code: None,
            asset_issuer: None,
        };
        assert_eq!(Asset::from_horizon(&native).unwrap(), Asset::Native);

        let issued = HorizonAsset {
            asset_type: "credit_alphanum4".to_string(),
            asset_code: Some("EURT".to_string()),
            asset_issuer: Some(ISSUER.to_string()),
        };
        assert_eq!(
            Asset::from_horizon(&issued).unwrap(),
            make_asset(Some("EURT"), Some(ISSUER)).unwrap()
        );
    }

    #[test]
    fn to_xdr_pads_asset_code() {
        let asset = make_asset(Some("BRL"), Some(ISSUER)).unwrap();
        match asset.to_xdr().unwrap() {
            xdr::Asset::CreditAlphanum4(a) => assert_eq!(a.asset_code.0, *b"BRL\0"),
            other => panic!("unexpected asset {other:?}"),
        }
    }
}
