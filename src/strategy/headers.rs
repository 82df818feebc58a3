//! Browser-like request headers for the upstream and relays.
//!
//! `Static` sends one fixed desktop profile. `Rotating` picks a profile from
//! [`PROFILES`] per call using an injected RNG, so tests can seed it.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::{Deserialize, Serialize};

const STATIC_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    #[default]
    Static,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

pub const PROFILES: [BrowserProfile; 4] = [
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept: "application/json, text/plain, */*",
        accept_language: "en-US,en;q=0.9",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        accept: "application/json, text/javascript, */*; q=0.01",
        accept_language: "en-GB,en;q=0.9",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
        accept: "application/json,text/html;q=0.9,*/*;q=0.8",
        accept_language: "en-US,en;q=0.5",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
        accept: "application/json, */*",
        accept_language: "id-ID,id;q=0.9,en;q=0.8",
    },
];

/// Shared, injectable randomness for header rotation.
pub type SharedRng = Arc<Mutex<Box<dyn RngCore + Send>>>;

pub fn os_rng() -> SharedRng {
    let rng: Box<dyn RngCore + Send> = Box::new(StdRng::from_os_rng());
    Arc::new(Mutex::new(rng))
}

pub fn seeded_rng(seed: u64) -> SharedRng {
    let rng: Box<dyn RngCore + Send> = Box::new(StdRng::seed_from_u64(seed));
    Arc::new(Mutex::new(rng))
}

pub fn pick_profile(rng: &mut dyn RngCore) -> &'static BrowserProfile {
    &PROFILES[rng.random_range(0..PROFILES.len())]
}

pub fn static_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(STATIC_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

pub fn profile_headers(profile: &BrowserProfile) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));
    headers.insert(ACCEPT, HeaderValue::from_static(profile.accept));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(profile.accept_language),
    );
    headers
}

/// Headers for one request. The lock is held only while drawing an index.
pub fn headers_for(mode: HeaderMode, rng: &SharedRng) -> HeaderMap {
    match mode {
        HeaderMode::Static => static_headers(),
        HeaderMode::Rotating => {
            let profile = {
                let mut guard = match rng.lock() {
                    Ok(g) => g,
                    Err(poison) => poison.into_inner(),
                };
                pick_profile(&mut **guard)
            };
            profile_headers(profile)
        }
    }
}
