//! Teacher capabilities and the gate the grading commands sit behind.
//!
//! The engine itself only consumes the outcome of a gate check as the
//! `is_privileged` flag on command payloads; the gate lives here so the
//! precedence rules have exactly one implementation.

use std::collections::HashMap;
use std::ops::BitOr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// Bit set of capabilities held by a teacher or required by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// Plain grading access; every enabled teacher has it implicitly.
    pub const DEFAULT: CapabilitySet = CapabilitySet(0);
    pub const SUPER_USER: CapabilitySet = CapabilitySet(1);
    pub const ADMIN: CapabilitySet = CapabilitySet(2);
    pub const SECRETARY: CapabilitySet = CapabilitySet(4);
    pub const ONLINE_COURSE: CapabilitySet = CapabilitySet(8);
    /// Account switched off entirely; overrides everything else.
    pub const DISABLED: CapabilitySet = CapabilitySet(16);

    pub fn contains(self, other: CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: CapabilitySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn from_bits(bits: u16) -> Self {
        CapabilitySet(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for CapabilitySet {
    type Output = CapabilitySet;

    fn bitor(self, rhs: Self) -> Self::Output {
        CapabilitySet(self.0 | rhs.0)
    }
}

/// Whether a holder of `held` may perform an action gated on `required`.
///
/// Precedence, checked in order:
/// 1. a disabled account is denied everything;
/// 2. a default-level requirement passes for any enabled account;
/// 3. a super-user is granted everything;
/// 4. a requirement that itself contains super-user is denied;
/// 5. an admin is granted everything;
/// 6. otherwise any overlap between held and required suffices.
pub fn has_capability(held: CapabilitySet, required: CapabilitySet) -> bool {
    if held.contains(CapabilitySet::DISABLED) {
        return false;
    }
    if required == CapabilitySet::DEFAULT {
        return true;
    }
    if held.contains(CapabilitySet::SUPER_USER) {
        return true;
    }
    if required.contains(CapabilitySet::SUPER_USER) {
        return false;
    }
    if held.contains(CapabilitySet::ADMIN) {
        return true;
    }
    held.intersects(required)
}

/// Source of truth for which capabilities a teacher holds.
#[async_trait]
pub trait TeacherDirectory: Send + Sync {
    async fn capabilities_of(&self, teacher_guid: Uuid) -> Result<Option<CapabilitySet>>;
}

/// Gate in front of a [`TeacherDirectory`] with a short-lived per-teacher
/// cache; the check runs on every grading request.
pub struct CapabilityGate<D> {
    directory: D,
    ttl: Duration,
    cache: Mutex<HashMap<Uuid, (Instant, CapabilitySet)>>,
}

impl<D: TeacherDirectory> CapabilityGate<D> {
    pub fn new(directory: D) -> Self {
        Self::with_ttl(directory, Duration::from_secs(300))
    }

    pub fn with_ttl(directory: D, ttl: Duration) -> Self {
        Self {
            directory,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, teacher_guid: Uuid, required: CapabilitySet) -> Result<bool> {
        let Some(held) = self.held(teacher_guid).await? else {
            return Ok(false);
        };
        Ok(has_capability(held, required))
    }

    /// The "secretary or admin" bit commands receive as `is_privileged`.
    pub async fn is_privileged(&self, teacher_guid: Uuid) -> Result<bool> {
        self.check(teacher_guid, CapabilitySet::SECRETARY).await
    }

    async fn held(&self, teacher_guid: Uuid) -> Result<Option<CapabilitySet>> {
        {
            let cache = self.lock_cache();
            if let Some((stored_at, held)) = cache.get(&teacher_guid)
                && stored_at.elapsed() < self.ttl
            {
                return Ok(Some(*held));
            }
        }

        let held = self.directory.capabilities_of(teacher_guid).await?;
        if let Some(held) = held {
            self.lock_cache()
                .insert(teacher_guid, (Instant::now(), held));
        }
        Ok(held)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, (Instant, CapabilitySet)>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
