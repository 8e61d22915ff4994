//! Pagination configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::range::DEFAULT_WINDOW_SIZE;

/// Host-level pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationConfig {
    /// Page sizes offered by the page size selector.
    pub page_size_options: Vec<usize>,
    pub initial_page_size: usize,
    /// Pages shown on each side of the current one in the pagination strip.
    pub pagination_window_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size_options: vec![5, 10, 20, 30, 40],
            initial_page_size: 10,
            pagination_window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size_options.is_empty() {
            return Err(Error::InvalidConfig(
                "pageSizeOptions must not be empty".to_string(),
            ));
        }

        if let Some(zero) = self.page_size_options.iter().find(|&&size| size == 0) {
            return Err(Error::InvalidConfig(format!(
                "pageSizeOptions must be positive, got {zero}"
            )));
        }

        if self.initial_page_size == 0 {
            return Err(Error::InvalidPageSize(self.initial_page_size));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PaginationConfig::default();
        assert_eq!(config.pagination_window_size, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_options_rejected() {
        let config = PaginationConfig {
            page_size_options: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_option_rejected() {
        let config = PaginationConfig {
            page_size_options: vec![10, 0],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_initial_page_size_rejected() {
        let config = PaginationConfig {
            initial_page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidPageSize(0)));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: PaginationConfig =
            serde_json::from_str(r#"{"initialPageSize": 20}"#).unwrap();
        assert_eq!(config.initial_page_size, 20);
        assert_eq!(config.page_size_options, vec![5, 10, 20, 30, 40]);
        assert_eq!(config.pagination_window_size, 2);
    }
}
