//! Scanner configuration and runtime data types

use std::time::Duration;
use serde::{Serialize, Deserialize};
use shared::CountryCode;

use crate::core::gate::DEFAULT_COOLDOWN;
use crate::core::phone::{PhoneRule, DEFAULT_LOCAL_MAX_LEN};
use crate::error::{ScannerError, ScannerResult};

/// Default welcome message, `{name}` is replaced with the attendee name
pub const DEFAULT_WELCOME_TEMPLATE: &str = "Welcome {name}! You are checked in.";

/// How long the "already registered" suppression lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryPolicy {
    /// Seed from the sheet at start and add every phone persisted during
    /// the session; a registered phone never checks in again
    Permanent,
    /// Cooldown only; the sheet is not consulted and nothing is remembered
    SessionCooldown,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        RegistryPolicy::Permanent
    }
}

impl RegistryPolicy {
    pub fn remembers_registrations(&self) -> bool {
        matches!(self, RegistryPolicy::Permanent)
    }
}

/// Scanner session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub cooldown: Duration,
    pub phone_rule: PhoneRule,
    pub registry_policy: RegistryPolicy,
    /// Capacity of the intake -> dispatcher channel
    pub queue_capacity: usize,
    /// How long the dispatcher waits for a check-in before looping
    pub poll_timeout: Duration,
    pub welcome_template: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            phone_rule: PhoneRule::new(CountryCode::default(), DEFAULT_LOCAL_MAX_LEN),
            registry_policy: RegistryPolicy::default(),
            queue_capacity: 64,
            poll_timeout: Duration::from_millis(100),
            welcome_template: DEFAULT_WELCOME_TEMPLATE.to_string(),
        }
    }
}

impl ScannerConfig {
    /// Reject values the session cannot run with
    pub fn validate(&self) -> ScannerResult<()> {
        if self.queue_capacity == 0 {
            return Err(ScannerError::config("queue capacity must be at least 1"));
        }
        if self.poll_timeout.is_zero() {
            return Err(ScannerError::config("poll timeout must be greater than zero"));
        }
        if self.phone_rule.local_max_len == 0 {
            return Err(ScannerError::config("local phone length must be at least 1"));
        }
        Ok(())
    }

    /// Render the welcome message for one attendee
    pub fn welcome_message(&self, name: &str) -> String {
        self.welcome_template.replace("{name}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert_eq!(config.phone_rule.country_code.to_string(), "+964");
        assert_eq!(config.phone_rule.local_max_len, 11);
        assert_eq!(config.registry_policy, RegistryPolicy::Permanent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = ScannerConfig { queue_capacity: 0, ..ScannerConfig::default() };
        assert!(matches!(config.validate(), Err(ScannerError::ConfigError { .. })));

        let config = ScannerConfig { poll_timeout: Duration::ZERO, ..ScannerConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_welcome_message() {
        let config = ScannerConfig::default();
        assert_eq!(config.welcome_message("John Doe"), "Welcome John Doe! You are checked in.");
    }

    #[test]
    fn test_registry_policy() {
        assert!(RegistryPolicy::Permanent.remembers_registrations());
        assert!(!RegistryPolicy::SessionCooldown.remembers_registrations());
    }
}
