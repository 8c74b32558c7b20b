//! CloudFront canned-policy URL signing, grounded on the original
//! implementation's `GetSignedObject` (`aws-sdk-go-v2/feature/cloudfront/sign`'s
//! `sign.NewURLSigner`), which signs a canned policy with the distribution's
//! RSA key pair rather than relying on the origin's own (S3 SigV4) signature.

use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;

#[derive(Debug, thiserror::Error)]
pub enum CloudFrontSignError {
    #[error("failed to read CloudFront private key at {path}: {source}")]
    ReadKey {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse CloudFront private key as PKCS#1 or PKCS#8 PEM")]
    ParseKey,
}

/// Signs resource URLs against a single CloudFront key pair using the
/// canned-policy form (one statement, no custom policy, `DateLessThan` only).
pub struct CloudFrontSigner {
    key_pair_id: String,
    signing_key: SigningKey<Sha1>,
}

impl CloudFrontSigner {
    pub fn load(key_pair_id: String, private_key_path: &str) -> Result<Self, CloudFrontSignError> {
        let pem =
            std::fs::read_to_string(private_key_path).map_err(|source| CloudFrontSignError::ReadKey {
                path: private_key_path.to_string(),
                source,
            })?;

        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|_| CloudFrontSignError::ParseKey)?;

        Ok(Self {
            key_pair_id,
            signing_key: SigningKey::<Sha1>::new(private_key),
        })
    }

    /// Returns `{resource_url}?Expires=...&Signature=...&Key-Pair-Id=...`.
    pub fn sign(&self, resource_url: &str, expires_at: DateTime<Utc>) -> String {
        let expires = expires_at.timestamp();
        let policy = canned_policy(resource_url, expires);
        let signature = self.signing_key.sign(policy.as_bytes());
        let encoded = cloudfront_base64(&signature.to_bytes());
        format!(
            "{resource_url}?Expires={expires}&Signature={encoded}&Key-Pair-Id={}",
            self.key_pair_id
        )
    }
}

fn canned_policy(resource_url: &str, expires: i64) -> String {
    format!(
        r#"{{"Statement":[{{"Resource":"{resource_url}","Condition":{{"DateLessThan":{{"AWS:EpochTime":{expires}}}}}}}]}}"#
    )
}

/// CloudFront's URL-safe base64 variant swaps the three characters that
/// aren't URL-safe: `+` -> `-`, `=` -> `_`, `/` -> `~`.
fn cloudfront_base64(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .encode(bytes)
        .replace('+', "-")
        .replace('=', "_")
        .replace('/', "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;

    fn write_test_key(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let pem = key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .unwrap()
            .to_string();
        let path = dir.path().join("cf.pem");
        std::fs::write(&path, pem).unwrap();
        path
    }

    #[test]
    fn signed_url_carries_expected_query_params() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = write_test_key(&dir);

        let signer =
            CloudFrontSigner::load("APKA_TEST".to_string(), key_path.to_str().unwrap()).unwrap();
        let expires = DateTime::from_timestamp(2_000_000_000, 0).unwrap();
        let signed = signer.sign("https://cdn.example.com/a/b.webp", expires);

        assert!(signed.starts_with("https://cdn.example.com/a/b.webp?Expires=2000000000&"));
        assert!(signed.contains("&Key-Pair-Id=APKA_TEST"));
        assert!(signed.contains("&Signature="));
    }

    #[test]
    fn signature_excludes_non_url_safe_base64_characters() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = write_test_key(&dir);
        let signer =
            CloudFrontSigner::load("APKA_TEST".to_string(), key_path.to_str().unwrap()).unwrap();
        let expires = DateTime::from_timestamp(2_000_000_000, 0).unwrap();
        let signed = signer.sign("https://cdn.example.com/a/b.webp", expires);
        let (_, signature_onward) = signed.split_once("&Signature=").unwrap();
        let signature = signature_onward.split('&').next().unwrap();
        assert!(!signature.contains('+'));
        assert!(!signature.contains('/'));
        assert!(!signature.contains('='));
    }

    #[test]
    fn missing_key_file_is_a_config_error() {
        let result = CloudFrontSigner::load("id".to_string(), "/nonexistent/path.pem");
        assert!(matches!(result, Err(CloudFrontSignError::ReadKey { .. })));
    }
}
