use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use domain::Viewer;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims {
    viewer_id: String,
    display_name: String,
    expires_at: i64,
}

/// Issues and checks viewer tokens: `base64url(claims).hex(hmac_sha256)`.
#[derive(Clone)]
pub struct IdentityGuard {
    secret: Arc<Vec<u8>>,
    ttl: Duration,
}

impl IdentityGuard {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.as_bytes().to_vec()),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    fn sign(&self, payload: &str) -> anyhow::Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| anyhow::anyhow!("Invalid token secret: {}", e))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Signs in a new viewer with a fresh random id.
    pub fn issue(&self, display_name: &str) -> anyhow::Result<(String, Viewer)> {
        let viewer = Viewer {
            id: format!("{:x}", rand::random::<u128>()),
            display_name: display_name.trim().to_string(),
        };
        let token = self.issue_for(&viewer, Utc::now().timestamp() + self.ttl.num_seconds())?;
        Ok((token, viewer))
    }

    fn issue_for(&self, viewer: &Viewer, expires_at: i64) -> anyhow::Result<String> {
        let claims = Claims {
            viewer_id: viewer.id.clone(),
            display_name: viewer.display_name.clone(),
            expires_at,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = self.sign(&payload)?;
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn verify(&self, token: &str) -> Option<Viewer> {
        let (payload, signature) = token.split_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let raw = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: Claims = serde_json::from_slice(&raw).ok()?;
        if Utc::now().timestamp() > claims.expires_at {
            return None;
        }
        Some(Viewer {
            id: claims.viewer_id,
            display_name: claims.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_flow() {
        let guard = IdentityGuard::new("secret", 24);

        let (token, viewer) = guard.issue(" Ferris ").unwrap();
        assert_eq!(viewer.display_name, "Ferris");
        assert!(!viewer.id.is_empty());
        assert_eq!(guard.verify(&token), Some(viewer.clone()));

        let other = IdentityGuard::new("another secret", 24);
        assert!(other.verify(&token).is_none());

        assert!(guard.verify("garbage").is_none());
        assert!(guard.verify("abc.zz").is_none());
    }

    #[test]
    fn tampered_or_expired_tokens_are_rejected() {
        let guard = IdentityGuard::new("secret", 24);
        let (token, viewer) = guard.issue("Maria").unwrap();

        let (_, sig) = token.split_once('.').unwrap();
        let forged_claims = Claims {
            viewer_id: "someone-else".into(),
            display_name: "Maria".into(),
            expires_at: i64::MAX,
        };
        let forged = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            sig
        );
        assert!(guard.verify(&forged).is_none());

        let expired = guard.issue_for(&viewer, Utc::now().timestamp() - 1).unwrap();
        assert!(guard.verify(&expired).is_none());
    }
}
