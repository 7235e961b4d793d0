use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::AppError;

/// Windows are swept once the map grows past this many client keys.
const SWEEP_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    hits: u32,
}

/// Fixed-window request limiter keyed by client address.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    message: &'static str,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max,
            window,
            message,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn login() -> Self {
        Self::new(
            5,
            Duration::from_secs(15 * 60),
            "Too many login attempts from this IP, please try again after 15 minutes",
        )
    }

    pub fn register() -> Self {
        Self::new(
            10,
            Duration::from_secs(60 * 60),
            "Too many registration attempts from this IP, please try again after 1 hour",
        )
    }

    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| anyhow::anyhow!("rate limiter lock poisoned"))?;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.hits = 0;
        }
        if entry.hits >= self.max {
            return Err(AppError::RateLimited(self.message));
        }
        entry.hits += 1;
        Ok(())
    }
}

fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&req);
    if let Err(e) = limiter.check(&key) {
        warn!(client = %key, path = %req.uri().path(), "rate limit exceeded");
        return Err(e);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), "slow down");
        let t0 = Instant::now();
        assert!(limiter.check_at("1.2.3.4", t0).is_ok());
        assert!(limiter.check_at("1.2.3.4", t0).is_ok());
        let err = limiter.check_at("1.2.3.4", t0).unwrap_err();
        assert!(matches!(err, AppError::RateLimited("slow down")));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), "slow down");
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0).is_ok());
        assert!(limiter.check_at("b", t0).is_ok());
        assert!(limiter.check_at("a", t0).is_err());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), "slow down");
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0).is_ok());
        assert!(limiter.check_at("a", t0 + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at("a", t0 + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn presets_match_login_and_register_policies() {
        let login = RateLimiter::login();
        let t0 = Instant::now();
        for _ in 0..5 {
            assert!(login.check_at("ip", t0).is_ok());
        }
        assert!(login.check_at("ip", t0).is_err());

        let register = RateLimiter::register();
        for _ in 0..10 {
            assert!(register.check_at("ip", t0).is_ok());
        }
        assert!(register.check_at("ip", t0).is_err());
    }
}
