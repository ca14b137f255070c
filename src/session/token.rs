use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry of a JWT bearer token, read from the unverified `exp` claim.
/// Opaque tokens (demo tokens, for instance) have no known expiry.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Utc.timestamp_opt(claims.exp?, 0).single()
}

pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).map_or(false, |exp| exp <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt_with_exp(exp: i64) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload =
            general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"ada","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_reads_exp_claim() {
        let now = Utc::now();
        let token = jwt_with_exp((now + Duration::hours(1)).timestamp());

        assert!(expires_at(&token).is_some());
        assert!(!is_expired(&token, now));
        assert!(is_expired(&token, now + Duration::hours(2)));
    }

    #[test]
    fn test_opaque_tokens_never_expire() {
        assert_eq!(expires_at("demo_token_123"), None);
        assert!(!is_expired("demo_token_123", Utc::now()));
        assert!(!is_expired("a.b.c.d", Utc::now()));
    }
}
