use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use rand::Rng;
use time::{Duration, OffsetDateTime};

use super::OtpManager;

pub const OTP_EXPIRY: Duration = Duration::minutes(10);

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

impl OtpRecord {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// In-memory one-time codes keyed by email address.
///
/// Shared across request tasks behind an `Arc`; every operation takes the
/// lock once so lookups and removals for a key are atomic.
#[derive(Debug)]
pub struct OtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
    ttl: Duration,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::with_ttl(OTP_EXPIRY)
    }
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        OtpStore {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, OtpRecord>> {
        // No operation can leave the map half-written, so a poisoned lock is still usable
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a fresh code for `email`, replacing whatever was stored before.
    #[tracing::instrument(name = "Generating email OTP", skip(self))]
    pub fn generate(&self, email: &str) -> String {
        let code = self.generate_otp();
        let record = OtpRecord {
            code: code.clone(),
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };

        self.records().insert(email.to_string(), record);
        tracing::info!("OTP issued");

        code
    }

    /// Check `code` against the stored one.
    ///
    /// A match consumes the record. An expired record is dropped whatever the
    /// submitted code. A mismatch leaves the record in place.
    #[tracing::instrument(name = "Verifying email OTP", skip(self, code))]
    pub fn verify(&self, email: &str, code: &str) -> bool {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records();

        let Some(record) = records.get(email) else {
            tracing::warn!("OTP not found");
            return false;
        };

        if record.is_expired(now) {
            records.remove(email);
            tracing::warn!("OTP expired");
            return false;
        }

        if record.code != code {
            tracing::warn!("OTP mismatch");
            return false;
        }

        records.remove(email);
        tracing::info!("OTP verified");

        true
    }

    pub fn clear(&self, email: &str) {
        self.records().remove(email);
    }

    /// Remove the record only while it still holds `code`.
    ///
    /// Returns whether a record was removed. A newer code issued for the same
    /// email is left alone.
    pub fn clear_if(&self, email: &str, code: &str) -> bool {
        let mut records = self.records();
        let matches = records.get(email).is_some_and(|record| record.code == code);

        if matches {
            records.remove(email);
        }

        matches
    }

    /// Drop every expired record, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records();
        let before = records.len();

        records.retain(|_, record| !record.is_expired(now));

        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn insert_record(&self, email: &str, record: OtpRecord) {
        self.records().insert(email.to_string(), record);
    }
}

impl OtpManager for OtpStore {
    fn generate_otp(&self) -> String {
        let value: u32 = rand::thread_rng().gen_range(0..1_000_000);

        format!("{:06}", value)
    }
}
