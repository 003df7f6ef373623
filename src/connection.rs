//! Connection details and dialog options supplied by the caller.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pagination::DEFAULT_MAX_PAGES;
use crate::responses::ScaCodes;
use crate::Error;

/// Default HBCI version (FinTS 3.0).
pub const DEFAULT_HBCI_VERSION: u32 = 300;

/// Country code used in bank identifications (Germany).
pub const COUNTRY_CODE: &str = "280";

/// Customer system id shared between dialogs that use the same bank login.
///
/// The id is assigned by the bank during synchronization. Clones share the same
/// cell, so every dialog created from one [ConnectionDetails] sees the id once any
/// of them has synchronized.
#[derive(Clone, Default)]
pub struct SharedSystemId(Arc<RwLock<Option<String>>>);

impl SharedSystemId {
    pub fn new(system_id: Option<String>) -> Self {
        SharedSystemId(Arc::new(RwLock::new(system_id)))
    }

    /// Current system id, if the connection has been synchronized.
    pub fn get(&self) -> Result<Option<String>, Error> {
        Ok(self.0.read()?.clone())
    }

    pub fn set(&self, system_id: impl Into<String>) -> Result<(), Error> {
        *self.0.write()? = Some(system_id.into());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), Error> {
        *self.0.write()? = None;
        Ok(())
    }
}

impl Debug for SharedSystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.read() {
            Ok(value) => write!(f, "SharedSystemId({:?})", *value),
            Err(_) => write!(f, "SharedSystemId(<poisoned>)"),
        }
    }
}

impl Serialize for SharedSystemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.get().map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedSystemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SharedSystemId::new(Option::<String>::deserialize(deserializer)?))
    }
}

/// Login and account data for one bank connection.
///
/// Owned by the caller and reused across dialogs so that the customer system id
/// obtained by synchronization is not requested again.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionDetails {
    /// FinTS endpoint of the bank.
    pub url: String,
    /// German bank code (Bankleitzahl).
    pub bank_code: String,
    pub bic: String,
    pub user_id: String,
    /// Customer id, if the bank distinguishes it from the user id.
    pub customer_id: Option<String>,
    #[serde(skip_serializing)]
    pub pin: String,
    pub account: String,
    pub iban: String,
    /// Name of the account holder, used as debtor/creditor in SEPA documents.
    pub account_holder: String,
    pub hbci_version: u32,
    /// Customer system id written back after synchronization.
    #[serde(rename = "customer_system_id")]
    pub system_id: SharedSystemId,
}

impl ConnectionDetails {
    /// Effective customer id.
    pub fn customer_id(&self) -> &str {
        self.customer_id.as_deref().unwrap_or(&self.user_id)
    }

    /// Effective HBCI version, defaulting to FinTS 3.0.
    pub fn hbci_version(&self) -> u32 {
        if self.hbci_version == 0 {
            DEFAULT_HBCI_VERSION
        } else {
            self.hbci_version
        }
    }

    /// Cached customer system id.
    pub fn customer_system_id(&self) -> Result<Option<String>, Error> {
        self.system_id.get()
    }
}

impl Debug for ConnectionDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("url", &self.url)
            .field("bank_code", &self.bank_code)
            .field("bic", &self.bic)
            .field("user_id", &self.user_id)
            .field("customer_id", &self.customer_id)
            .field("pin", &"***")
            .field("account", &self.account)
            .field("iban", &self.iban)
            .field("account_holder", &self.account_holder)
            .field("hbci_version", &self.hbci_version())
            .field("system_id", &self.system_id)
            .finish()
    }
}

/// Tunables for the dialog engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogOptions {
    /// Product registration id issued by the Deutsche Kreditwirtschaft.
    pub product_id: String,
    pub product_version: String,
    /// Upper bound on statement pages followed through continuation cursors.
    pub max_pages: usize,
    /// Return codes that announce a strong customer authentication challenge.
    pub sca_codes: ScaCodes,
    /// Preferred TAN procedure (security function). When unset the first two-step
    /// procedure allowed by the bank is used, falling back to one-step `999`.
    pub tan_procedure: Option<String>,
    /// Name of the TAN medium to announce in TAN requests, if the bank requires one.
    pub tan_medium: Option<String>,
    /// Run operations in an anonymous dialog: no synchronization, no PIN and no
    /// signature segments. Only useful for operations the bank offers without login.
    pub anonymous: bool,
}

impl Default for DialogOptions {
    fn default() -> Self {
        DialogOptions {
            product_id: String::from("FINTSRS"),
            product_version: String::from(env!("CARGO_PKG_VERSION")),
            max_pages: DEFAULT_MAX_PAGES,
            sca_codes: ScaCodes::default(),
            tan_procedure: None,
            tan_medium: None,
            anonymous: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_system_id() {
        let details = ConnectionDetails {
            user_id: "user".into(),
            ..Default::default()
        };
        let other = details.clone();

        assert_eq!(details.customer_system_id().unwrap(), None);
        other.system_id.set("SYS123").unwrap();
        assert_eq!(details.customer_system_id().unwrap(), Some("SYS123".to_string()));

        details.system_id.clear().unwrap();
        assert_eq!(other.customer_system_id().unwrap(), None);
    }

    #[test]
    fn test_customer_id_defaults_to_user_id() {
        let mut details = ConnectionDetails {
            user_id: "user".into(),
            ..Default::default()
        };
        assert_eq!(details.customer_id(), "user");

        details.customer_id = Some("customer".into());
        assert_eq!(details.customer_id(), "customer");
    }

    #[test]
    fn test_hbci_version_default() {
        let details = ConnectionDetails::default();
        assert_eq!(details.hbci_version(), DEFAULT_HBCI_VERSION);
    }

    #[test]
    fn test_debug_redacts_pin() {
        let details = ConnectionDetails {
            pin: "secret".into(),
            ..Default::default()
        };
        let debug = format!("{details:?}");

        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_default_options() {
        let options = DialogOptions::default();

        assert_eq!(options.max_pages, 100);
        assert!(options.sca_codes.contains("0030"));
        assert!(options.tan_procedure.is_none());
        assert!(!options.anonymous);
    }
}
