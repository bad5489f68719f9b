use std::time::Duration;

use menushade_protocol::constants::DEFAULT_REHIDE_DELAY;

/// Per-signal policy knobs applied by the arbitrator.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPolicy {
    /// Schedule a rehide after every successful reveal.
    pub auto_rehide: bool,
    pub rehide_delay: Duration,
    /// Network identities that reveal the hidden section. Exact,
    /// case-sensitive match.
    pub trusted_networks: Vec<String>,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            auto_rehide: true,
            rehide_delay: DEFAULT_REHIDE_DELAY,
            trusted_networks: Vec::new(),
        }
    }
}

impl TriggerPolicy {
    /// Whether `identity` is on the allow-list. Absent or empty never matches.
    pub fn matches_network(&self, identity: Option<&str>) -> bool {
        identity.is_some_and(|id| !id.is_empty() && self.trusted_networks.iter().any(|n| n == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(networks: &[&str]) -> TriggerPolicy {
        TriggerPolicy {
            trusted_networks: networks.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let p = TriggerPolicy::default();
        assert!(p.auto_rehide);
        assert_eq!(p.rehide_delay, Duration::from_secs(5));
        assert!(p.trusted_networks.is_empty());
    }

    #[test]
    fn network_match_is_exact_and_case_sensitive() {
        let p = policy(&["HomeWiFi", "Café Network", " Spaced"]);
        assert!(p.matches_network(Some("HomeWiFi")));
        assert!(p.matches_network(Some("Café Network")));
        assert!(!p.matches_network(Some("homewifi")));
        assert!(!p.matches_network(Some("HOMEWIFI")));
        assert!(!p.matches_network(Some("Spaced")));
        assert!(p.matches_network(Some(" Spaced")));
    }

    #[test]
    fn absent_or_empty_identity_never_matches() {
        let p = policy(&["", "Home"]);
        assert!(!p.matches_network(None));
        assert!(!p.matches_network(Some("")));
        assert!(!policy(&[]).matches_network(Some("Home")));
    }
}
