use crate::*;
use std::env::var;

/// Number of ballot batches a voter submits per attempt
pub const DEFAULT_BATCHES_COUNT: usize = 10;

/// Commission RSA modulus size in bits
pub const DEFAULT_KEY_SIZE: usize = 512;

const MIN_KEY_SIZE: usize = 512;
const MAX_KEY_SIZE: usize = 4096;

/// Protocol-wide settings shared by the commission and its voters
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Number of batches in a collection. One is spared, the rest are audited.
    pub batches_count: usize,

    /// Size of the commission's RSA modulus, in bits
    pub key_size: usize,

    /// Whether a voter may replace its blinding factor after a failed attempt
    pub allow_blinding_factor_renewal: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            batches_count: DEFAULT_BATCHES_COUNT,
            key_size: DEFAULT_KEY_SIZE,
            allow_blinding_factor_renewal: false,
        }
    }
}

impl ProtocolConfig {
    /// Read the configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `BLINDVOTE_BATCHES_COUNT`, `BLINDVOTE_KEY_SIZE`
    /// and `BLINDVOTE_ALLOW_RENEWAL`.
    pub fn from_env() -> Result<Self, VotingError> {
        let mut config = ProtocolConfig::default();

        if let Ok(val) = var("BLINDVOTE_BATCHES_COUNT") {
            config.batches_count = parse_env("BLINDVOTE_BATCHES_COUNT", &val)?;
        }

        if let Ok(val) = var("BLINDVOTE_KEY_SIZE") {
            config.key_size = parse_env("BLINDVOTE_KEY_SIZE", &val)?;
        }

        if let Ok(val) = var("BLINDVOTE_ALLOW_RENEWAL") {
            config.allow_blinding_factor_renewal = parse_env("BLINDVOTE_ALLOW_RENEWAL", &val)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, VotingError> {
        let config: ProtocolConfig = serde_json::from_slice(bytes)
            .map_err(|e| VotingError::InvalidConfig(format!("{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VotingError> {
        if self.batches_count < 2 {
            return Err(VotingError::InvalidConfig(format!(
                "batches_count must be at least 2, got {}",
                self.batches_count
            )));
        }
        if self.key_size < MIN_KEY_SIZE || self.key_size > MAX_KEY_SIZE {
            return Err(VotingError::InvalidConfig(format!(
                "key_size must be between {} and {} bits, got {}",
                MIN_KEY_SIZE, MAX_KEY_SIZE, self.key_size
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str) -> Result<T, VotingError> {
    val.trim()
        .parse()
        .map_err(|_| VotingError::InvalidConfig(format!("{} has an invalid value: {}", name, val)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ProtocolConfig::default();
        assert_eq!(config.batches_count, 10);
        assert_eq!(config.key_size, 512);
        assert!(!config.allow_blinding_factor_renewal);
        config.validate().unwrap();
    }

    #[test]
    fn config_from_json() {
        let config = ProtocolConfig::from_json(br#"{"batches_count": 4}"#).unwrap();
        assert_eq!(config.batches_count, 4);
        assert_eq!(config.key_size, DEFAULT_KEY_SIZE);

        assert!(matches!(
            ProtocolConfig::from_json(br#"{"batches_count": 1}"#),
            Err(VotingError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProtocolConfig::from_json(br#"{"key_size": 128}"#),
            Err(VotingError::InvalidConfig(_))
        ));
        assert!(ProtocolConfig::from_json(b"not json").is_err());
    }

    // Every variable is set and cleared inside this one test so no other test
    // observes them.
    #[test]
    fn config_from_env() {
        use std::env::{remove_var, set_var};
        const VARS: [&str; 3] = [
            "BLINDVOTE_BATCHES_COUNT",
            "BLINDVOTE_KEY_SIZE",
            "BLINDVOTE_ALLOW_RENEWAL",
        ];
        let clear = || VARS.iter().for_each(|name| remove_var(name));

        clear();
        assert_eq!(ProtocolConfig::from_env().unwrap(), ProtocolConfig::default());

        set_var("BLINDVOTE_BATCHES_COUNT", "4");
        set_var("BLINDVOTE_KEY_SIZE", "1024");
        set_var("BLINDVOTE_ALLOW_RENEWAL", "true");
        let config = ProtocolConfig::from_env();
        clear();
        assert_eq!(
            config.unwrap(),
            ProtocolConfig {
                batches_count: 4,
                key_size: 1024,
                allow_blinding_factor_renewal: true,
            }
        );

        set_var("BLINDVOTE_BATCHES_COUNT", "1");
        let too_few_batches = ProtocolConfig::from_env();
        clear();
        assert!(matches!(too_few_batches, Err(VotingError::InvalidConfig(_))));

        set_var("BLINDVOTE_KEY_SIZE", "abc");
        let unparsable = ProtocolConfig::from_env();
        clear();
        assert!(matches!(
            unparsable,
            Err(VotingError::InvalidConfig(message)) if message.contains("BLINDVOTE_KEY_SIZE")
        ));
    }

    #[test]
    fn parse_env_values() {
        assert_eq!(parse_env::<usize>("X", " 12 ").unwrap(), 12);
        assert!(parse_env::<bool>("X", "true").unwrap());
        assert!(parse_env::<usize>("X", "twelve").is_err());
    }
}
