//! MySQL/MariaDB platform

use super::{Aggregate, Feature, Platform, PlatformKind};

/// Largest row count MySQL accepts, used when only an offset is given
const MYSQL_MAX_ROWS: u64 = 18446744073709551615;

/// MySQL/MariaDB platform
pub struct MySqlPlatform;

impl MySqlPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MySqlPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MySqlPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::MySql
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) if offset > 0 => {
                format!(" LIMIT {} OFFSET {}", limit, offset)
            }
            (Some(limit), _) => format!(" LIMIT {}", limit),
            // MySQL has no OFFSET without LIMIT
            (None, Some(offset)) if offset > 0 => {
                format!(" LIMIT {} OFFSET {}", MYSQL_MAX_ROWS, offset)
            }
            (None, _) => String::new(),
        }
    }

    fn aggregate_function(&self, aggregate: Aggregate) -> Option<&'static str> {
        Some(match aggregate {
            Aggregate::Avg => "AVG",
            Aggregate::Count | Aggregate::CountDistinct => "COUNT",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Std => "STD",
            Aggregate::Sum => "SUM",
        })
    }

    fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::CountDistinct | Feature::Replace => true,
            Feature::Returning => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_backticks() {
        let platform = MySqlPlatform::new();
        assert_eq!(platform.quote_identifier("users"), "`users`");
        assert_eq!(platform.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_limit_offset() {
        let platform = MySqlPlatform::new();
        assert_eq!(platform.limit_offset(None, None), "");
        assert_eq!(platform.limit_offset(Some(10), None), " LIMIT 10");
        assert_eq!(platform.limit_offset(Some(10), Some(0)), " LIMIT 10");
        assert_eq!(platform.limit_offset(Some(10), Some(20)), " LIMIT 10 OFFSET 20");
        assert_eq!(
            platform.limit_offset(None, Some(5)),
            " LIMIT 18446744073709551615 OFFSET 5"
        );
    }

    #[test]
    fn test_features() {
        let platform = MySqlPlatform::new();
        assert!(platform.supports(Feature::CountDistinct));
        assert!(platform.supports(Feature::Replace));
        assert!(!platform.supports(Feature::Returning));
        assert_eq!(platform.aggregate_function(Aggregate::Std), Some("STD"));
    }
}
