use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    access_checks: AtomicU64,
    access_granted: AtomicU64,
    access_denied: AtomicU64,
    token_rejected: AtomicU64,
    login_success: AtomicU64,
    login_failure: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self) {
        self.access_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_granted(&self) {
        self.access_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.access_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Inactive or expired token.
    pub fn record_token_rejected(&self) {
        self.token_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_success(&self) {
        self.login_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_failure(&self) {
        self.login_failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn access_checks(&self) -> u64 {
        self.access_checks.load(Ordering::Relaxed)
    }

    pub fn access_granted(&self) -> u64 {
        self.access_granted.load(Ordering::Relaxed)
    }

    pub fn access_denied(&self) -> u64 {
        self.access_denied.load(Ordering::Relaxed)
    }

    pub fn token_rejected(&self) -> u64 {
        self.token_rejected.load(Ordering::Relaxed)
    }

    pub fn login_success(&self) -> u64 {
        self.login_success.load(Ordering::Relaxed)
    }

    pub fn login_failure(&self) -> u64 {
        self.login_failure.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            (
                "trellis_access_checks_total",
                "Total number of access checks.",
                self.access_checks(),
            ),
            (
                "trellis_access_granted_total",
                "Access checks that were granted.",
                self.access_granted(),
            ),
            (
                "trellis_access_denied_total",
                "Access checks denied for a missing permission.",
                self.access_denied(),
            ),
            (
                "trellis_token_rejected_total",
                "Access checks rejected for an inactive or expired token.",
                self.token_rejected(),
            ),
            (
                "trellis_login_success_total",
                "Successful logins.",
                self.login_success(),
            ),
            (
                "trellis_login_failure_total",
                "Failed logins.",
                self.login_failure(),
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} counter\n"));
            output.push_str(&format!("{name} {value}\n"));
        }
        output
    }
}
