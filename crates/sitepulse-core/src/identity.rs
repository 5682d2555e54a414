use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Observable client environment signals used for fingerprinting.
///
/// All fields are best-effort strings/numbers the hosting page can read
/// without cookies. An all-default `ClientEnv` is valid and simply yields a
/// less distinctive fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientEnv {
    pub user_agent: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub timezone_offset_minutes: i32,
    /// Short sample of a canvas rendering, as produced by the host page.
    pub canvas_sample: String,
}

/// Compute a coarse device/browser fingerprint.
///
/// Formula: sha256(ua[0..20] | language | WxH | tz_offset | canvas[0..50])
/// truncated to 10 hex chars. Non-cryptographic identification only: two
/// devices with identical configuration collide by design, and the value
/// changes whenever any input signal changes.
pub fn fingerprint(env: &ClientEnv) -> String {
    let ua: String = env.user_agent.chars().take(20).collect();
    let canvas: String = env.canvas_sample.chars().take(50).collect();
    let input = format!(
        "{}|{}|{}x{}|{}|{}",
        ua, env.language, env.screen_width, env.screen_height, env.timezone_offset_minutes, canvas
    );
    let hash = Sha256::digest(input.as_bytes());
    // First 5 bytes → 10 hex characters.
    hex::encode(&hash[..5])
}

/// Generate a new visitor id: `v_{epoch_ms}_{token13}_{fingerprint}`.
///
/// Called only when tab-scoped storage holds no id yet; existing ids are
/// reused directly and never recomputed, so the timestamp and random token
/// make the id stable for the storage lifetime but not across storage clears
/// or browsers.
pub fn generate_visitor_id(env: &ClientEnv) -> String {
    format!(
        "v_{}_{}_{}",
        Utc::now().timestamp_millis(),
        rand_token(13),
        fingerprint(env)
    )
}

/// Generate a new session id: `s_{epoch_ms}_{token8}`.
pub fn generate_session_id() -> String {
    format!("s_{}_{}", Utc::now().timestamp_millis(), rand_token(8))
}

fn rand_token(len: usize) -> String {
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(len)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> ClientEnv {
        ClientEnv {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/120".to_string(),
            language: "en-US".to_string(),
            screen_width: 1920,
            screen_height: 1080,
            timezone_offset_minutes: -60,
            canvas_sample: "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg".to_string(),
        }
    }

    #[test]
    fn fingerprint_is_10_hex_chars() {
        let fp = fingerprint(&env());
        assert_eq!(fp.len(), 10);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint(&env()), fingerprint(&env()));
    }

    #[test]
    fn fingerprint_changes_with_any_signal() {
        let mut other = env();
        other.language = "pl-PL".to_string();
        assert_ne!(fingerprint(&env()), fingerprint(&other));
    }

    #[test]
    fn visitor_id_has_expected_shape() {
        let id = generate_visitor_id(&env());
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4, "v_timestamp_token_fingerprint");
        assert_eq!(parts[0], "v");
        assert!(parts[1].parse::<i64>().is_ok(), "epoch millis");
        assert_eq!(parts[2].len(), 13);
        assert_eq!(parts[3].len(), 10);
    }

    #[test]
    fn session_id_has_expected_shape() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "s");
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn generated_ids_are_distinct() {
        // The random token makes collisions vanishingly unlikely even within
        // the same millisecond.
        let a = generate_visitor_id(&env());
        let b = generate_visitor_id(&env());
        assert_ne!(a, b);
    }
}
