#[cfg(debug_assertions)]
pub fn get_backend_url() -> &'static str {
    match option_env!("PLANPIX_BACKEND_URL") {
        Some(url) => url,
        None => "http://localhost:54321", // Local development stack
    }
}

#[cfg(not(debug_assertions))]
pub fn get_backend_url() -> &'static str {
    match option_env!("PLANPIX_BACKEND_URL") {
        Some(url) => url,
        None => "", // Same origin in production
    }
}

/// Public key sent as the `apikey` header on every backend call.
pub fn get_anon_key() -> &'static str {
    option_env!("PLANPIX_ANON_KEY").unwrap_or("")
}

pub const POLL_INTERVAL_MS: u32 = 5_000;
pub const REDIRECT_DELAY_MS: u32 = 2_000;
// A PIX charge lives for 30 minutes; 360 polls at 5s cover it.
pub const MAX_POLL_ATTEMPTS: u32 = 360;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowTiming {
    pub poll_interval_ms: u32,
    pub redirect_delay_ms: u32,
    pub max_poll_attempts: u32,
}

impl Default for FlowTiming {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            redirect_delay_ms: REDIRECT_DELAY_MS,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}
