use tracing::info;

/// Gestures needed to reach elevated mode.
pub const ESCALATION_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Locked,
    Normal,
    Elevated,
}

/// Result of one hidden-gesture bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Counter moved but the threshold is not reached yet.
    Pending(u32),
    /// This bump reached the threshold.
    Elevated,
    /// Elevated mode was already on.
    AlreadyElevated,
}

/// Session-scoped permission state.
///
/// The auth token doubles as the lock flag: `None` means locked. `elevated`
/// only ever goes from false to true; the only way back is a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    auth_token: Option<String>,
    elevated: bool,
    escalation_counter: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn is_unlocked(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    pub fn escalation_counter(&self) -> u32 {
        self.escalation_counter
    }

    /// Observable permission level. Elevation reached while locked stays
    /// invisible until the session is unlocked.
    pub fn level(&self) -> PermissionLevel {
        match (self.is_unlocked(), self.elevated) {
            (false, _) => PermissionLevel::Locked,
            (true, false) => PermissionLevel::Normal,
            (true, true) => PermissionLevel::Elevated,
        }
    }

    /// Stores the verified password as the session token.
    pub fn unlock(&mut self, password: impl Into<String>) {
        self.auth_token = Some(password.into());
        info!(elevated = self.elevated, "session unlocked");
    }

    pub fn bump_escalation(&mut self) -> Escalation {
        self.escalation_counter = self.escalation_counter.saturating_add(1);
        if self.elevated {
            return Escalation::AlreadyElevated;
        }
        if self.escalation_counter >= ESCALATION_THRESHOLD {
            self.elevated = true;
            info!("elevated mode enabled");
            return Escalation::Elevated;
        }
        Escalation::Pending(self.escalation_counter)
    }
}
