//! Per-account device identity.
//!
//! Sign-in grade requests must look like they come from one device for the
//! whole session, so both values are derived from the account id and computed
//! at most once per client.

use std::sync::OnceLock;

const MODEL_PREFIX: &str = "Yz-";

/// Stable pseudo-device fingerprint for one account
#[derive(Debug)]
pub struct DeviceIdentity {
    uid: String,
    configured_id: Option<String>,
    model: OnceLock<String>,
    id: OnceLock<String>,
}

impl DeviceIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            configured_id: None,
            model: OnceLock::new(),
            id: OnceLock::new(),
        }
    }

    /// Use a fixed device id instead of the derived one
    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.configured_id = device_id.filter(|id| !id.is_empty());
        self
    }

    /// Device model and name, `Yz-` followed by five hex digits of the uid hash
    pub fn model(&self) -> &str {
        self.model.get_or_init(|| {
            let digest = format!("{:x}", md5::compute(self.uid.as_bytes()));
            format!("{MODEL_PREFIX}{}", &digest[..5])
        })
    }

    /// GUID-shaped device id
    pub fn id(&self) -> &str {
        self.id.get_or_init(|| {
            if let Some(id) = &self.configured_id {
                return id.clone();
            }
            let digest = format!("{:x}", md5::compute(format!("device:{}", self.uid)));
            format!(
                "{}-{}-{}-{}-{}",
                &digest[0..8],
                &digest[8..12],
                &digest[12..16],
                &digest[16..20],
                &digest[20..32]
            )
        })
    }
}
