//! Client-side checks applied to the ISO builder form before anything is
//! sent to the backend.

use thiserror::Error;

use crate::types::BuildConfig;

pub const DEFAULT_POOL_URL: &str = "stratum+tcp://ae.2miners.com:4040";
pub const STRATUM_PREFIX: &str = "stratum+tcp://";
pub const WALLET_PREFIX: &str = "ak_";
pub const POWER_LIMIT_RANGE: std::ops::RangeInclusive<i32> = 100..=300;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid wallet address. Must start with \"ak_\"")]
    InvalidWallet,
    #[error("Worker name is required")]
    MissingWorker,
    #[error("Custom pool URL is required")]
    MissingCustomPool,
    #[error("Pool URL must start with \"stratum+tcp://\"")]
    InvalidPoolUrl,
    #[error("Power limit must be between 100 and 300 W")]
    PowerLimitOutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelection {
    Preset(String),
    Custom,
}

impl PoolSelection {
    /// `custom` selects the free-text pool field, anything else is taken as a
    /// preset URL.
    pub fn from_arg(value: &str) -> Self {
        if value.eq_ignore_ascii_case("custom") {
            PoolSelection::Custom
        } else {
            PoolSelection::Preset(value.trim().to_string())
        }
    }
}

impl Default for PoolSelection {
    fn default() -> Self {
        PoolSelection::Preset(DEFAULT_POOL_URL.to_string())
    }
}

/// Raw field values as the user typed them.
#[derive(Debug, Clone)]
pub struct BuildForm {
    pub wallet: String,
    pub worker: String,
    pub pool: PoolSelection,
    pub custom_pool: String,
    pub power_limit: i32,
    pub core_offset: i32,
    pub mem_offset: i32,
}

impl Default for BuildForm {
    fn default() -> Self {
        Self {
            wallet: String::new(),
            worker: String::new(),
            pool: PoolSelection::default(),
            custom_pool: String::new(),
            power_limit: 200,
            core_offset: 0,
            mem_offset: 0,
        }
    }
}

impl BuildForm {
    /// Checks the rules in order and stops at the first one that fails.
    pub fn validate(&self) -> Result<BuildConfig, ValidationError> {
        let wallet = self.wallet.trim();
        if !wallet.starts_with(WALLET_PREFIX) {
            return Err(ValidationError::InvalidWallet);
        }

        let worker = self.worker.trim();
        if worker.is_empty() {
            return Err(ValidationError::MissingWorker);
        }

        let pool_url = match &self.pool {
            PoolSelection::Preset(url) => url.clone(),
            PoolSelection::Custom => {
                let custom = self.custom_pool.trim();
                if custom.is_empty() {
                    return Err(ValidationError::MissingCustomPool);
                }
                if !custom.starts_with(STRATUM_PREFIX) {
                    return Err(ValidationError::InvalidPoolUrl);
                }
                custom.to_string()
            }
        };

        if !POWER_LIMIT_RANGE.contains(&self.power_limit) {
            return Err(ValidationError::PowerLimitOutOfRange(self.power_limit));
        }

        Ok(BuildConfig {
            wallet: wallet.to_string(),
            worker_name: worker.to_string(),
            pool_url,
            power_limit: self.power_limit,
            core_offset: self.core_offset,
            mem_offset: self.mem_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BuildForm {
        BuildForm {
            wallet: "ak_2swhLkgBPeeADxVTAVCJnZLY5NZtCFiM93JxsEaMuC59euuFRQ".to_string(),
            worker: "rig01".to_string(),
            ..BuildForm::default()
        }
    }

    #[test]
    fn should_accept_valid_form_with_preset_pool() {
        let config = valid_form().validate().unwrap();
        assert_eq!(config.worker_name, "rig01");
        assert_eq!(config.pool_url, DEFAULT_POOL_URL);
        assert_eq!(config.power_limit, 200);
    }

    #[test]
    fn should_reject_wallets_without_ak_prefix() {
        for wallet in ["", "ak", "AK_abc", "0xdeadbeef", " bk_abc", "a k_abc"] {
            let form = BuildForm {
                wallet: wallet.to_string(),
                ..valid_form()
            };
            let err = form.validate().unwrap_err();
            assert_eq!(err, ValidationError::InvalidWallet, "wallet {wallet:?}");
            assert_eq!(
                err.to_string(),
                "Invalid wallet address. Must start with \"ak_\""
            );
        }
    }

    #[test]
    fn should_trim_wallet_before_checking_prefix() {
        let form = BuildForm {
            wallet: "  ak_abc  ".to_string(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap().wallet, "ak_abc");
    }

    #[test]
    fn should_reject_blank_worker_name() {
        let form = BuildForm {
            worker: "   ".to_string(),
            ..valid_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Worker name is required");
    }

    #[test]
    fn should_check_wallet_before_worker() {
        let form = BuildForm {
            wallet: "nope".to_string(),
            worker: String::new(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap_err(), ValidationError::InvalidWallet);
    }

    #[test]
    fn should_require_custom_pool_text_when_custom_selected() {
        let form = BuildForm {
            pool: PoolSelection::Custom,
            custom_pool: "  ".to_string(),
            ..valid_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Custom pool URL is required");
    }

    #[test]
    fn should_reject_custom_pool_without_stratum_prefix() {
        for url in ["pool.example.com:4040", "stratum+ssl://pool:4040", "http://pool"] {
            let form = BuildForm {
                pool: PoolSelection::Custom,
                custom_pool: url.to_string(),
                ..valid_form()
            };
            let err = form.validate().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Pool URL must start with \"stratum+tcp://\"",
                "url {url:?}"
            );
        }
    }

    #[test]
    fn should_use_trimmed_custom_pool_url() {
        let form = BuildForm {
            pool: PoolSelection::Custom,
            custom_pool: " stratum+tcp://my.pool:3333 ".to_string(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap().pool_url, "stratum+tcp://my.pool:3333");
    }

    #[test]
    fn should_reject_power_limit_outside_range() {
        let form = BuildForm {
            power_limit: 350,
            ..valid_form()
        };
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::PowerLimitOutOfRange(350)
        );
    }

    #[test]
    fn should_parse_pool_selection_argument() {
        assert_eq!(PoolSelection::from_arg("custom"), PoolSelection::Custom);
        assert_eq!(
            PoolSelection::from_arg("stratum+tcp://a:1"),
            PoolSelection::Preset("stratum+tcp://a:1".to_string())
        );
    }
}
