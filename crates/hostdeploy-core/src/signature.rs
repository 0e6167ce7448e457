//! Deploy signatures.
//!
//! A signature is the SHA-256 of the identifying fields of a successful
//! deploy (channel id or hostname, URLs, expiry), truncated to
//! [`SIGNATURE_LEN`] hex characters. Raw tool output never contributes, so
//! re-rendering the same deploy state yields the same signature.

use sha2::{Digest, Sha256};

use crate::domain::DeploySuccess;

/// Length of a rendered signature in hex characters.
pub const SIGNATURE_LEN: usize = 12;

/// Compute the signature of a successful deploy.
pub fn derive_signature(success: &DeploySuccess) -> String {
    let mut hasher = Sha256::new();
    match success {
        DeploySuccess::Channel(channel) => {
            hasher.update(b"channel\0");
            hasher.update(channel.channel_id.as_bytes());
            hasher.update(b"\0");
            for url in &channel.urls {
                hasher.update(url.as_bytes());
                hasher.update(b"\0");
            }
            hasher.update(channel.expire_time.timestamp_millis().to_be_bytes());
        }
        DeploySuccess::Production(production) => {
            hasher.update(b"production\0");
            hasher.update(production.hostname.as_bytes());
            hasher.update(b"\0");
            hasher.update(production.url.as_bytes());
        }
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(SIGNATURE_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelDeploy, ProductionDeploy};
    use chrono::{TimeZone, Utc};

    fn channel(raw: &str) -> DeploySuccess {
        DeploySuccess::Channel(ChannelDeploy {
            channel_id: "pr-5".to_string(),
            urls: vec!["https://x--pr-5.web.app".to_string()],
            expire_time: Utc.with_ymd_and_hms(2026, 10, 25, 12, 0, 0).unwrap(),
            raw: raw.to_string(),
        })
    }

    #[test]
    fn test_signature_is_short_hex() {
        let sig = derive_signature(&channel("{}"));
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_deterministic() {
        assert_eq!(derive_signature(&channel("{}")), derive_signature(&channel("{}")));
    }

    #[test]
    fn test_signature_ignores_raw_output() {
        let a = derive_signature(&channel("{\"status\":\"success\"}"));
        let b = derive_signature(&channel("completely different log text"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_changes_with_expiry() {
        let a = channel("");
        let mut b = channel("");
        if let DeploySuccess::Channel(ref mut c) = b {
            c.expire_time = Utc.with_ymd_and_hms(2026, 10, 26, 12, 0, 0).unwrap();
        }
        assert_ne!(derive_signature(&a), derive_signature(&b));
    }

    #[test]
    fn test_production_and_channel_differ() {
        let production = DeploySuccess::Production(ProductionDeploy {
            hostname: "pr-5".to_string(),
            url: "https://x--pr-5.web.app".to_string(),
            raw: String::new(),
        });
        assert_ne!(derive_signature(&production), derive_signature(&channel("")));
    }
}
