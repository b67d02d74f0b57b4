//! Tree configuration: minimum degree and storage variant

use serde::{Deserialize, Serialize};

use super::error::{BTreeError, BTreeResult};

/// Default minimum degree sized for 8KB pages
/// - A full node holds 2t-1 = 499 entries
/// - 499 entries * 16 bytes + 16 byte header = 8000 bytes
pub const DEFAULT_MIN_DEGREE: usize = 250;

/// Where payloads live and whether leaves are chained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Every node carries payloads; no leaf chain.
    BTree,
    /// Payloads only in leaves, separators copied upward, leaves linked by `next`.
    #[default]
    BPlusTree,
}

impl Variant {
    pub fn stores_values_in_leaves_only(self) -> bool {
        matches!(self, Variant::BPlusTree)
    }
}

/// Construction parameters for a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Minimum degree `t`: non-root nodes hold between t-1 and 2t-1 keys
    pub min_degree: usize,
    pub variant: Variant,
}

impl TreeConfig {
    pub fn new(min_degree: usize, variant: Variant) -> Self {
        Self {
            min_degree,
            variant,
        }
    }

    /// Parse a configuration from a JSON document
    ///
    /// Missing fields fall back to their defaults. The result is validated.
    pub fn from_json(json: &str) -> BTreeResult<Self> {
        let config: TreeConfig =
            serde_json::from_str(json).map_err(|e| BTreeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BTreeResult<()> {
        // 2t-1 must fit in a usize
        if self.min_degree < 2 || self.min_degree.checked_mul(2).is_none() {
            return Err(BTreeError::InvalidOrder(self.min_degree));
        }
        Ok(())
    }

    /// Maximum keys in any node (2t-1)
    pub fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    /// Minimum keys in a non-root node (t-1)
    pub fn min_keys(&self) -> usize {
        self.min_degree - 1
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DEGREE, Variant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TreeConfig::default();
        assert_eq!(config.min_degree, DEFAULT_MIN_DEGREE);
        assert_eq!(config.variant, Variant::BPlusTree);
        assert_eq!(config.max_keys(), 499);
        assert_eq!(config.min_keys(), 249);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_degree() {
        assert_eq!(
            TreeConfig::new(1, Variant::BTree).validate(),
            Err(BTreeError::InvalidOrder(1))
        );
        assert_eq!(
            TreeConfig::new(0, Variant::BPlusTree).validate(),
            Err(BTreeError::InvalidOrder(0))
        );
    }

    #[test]
    fn test_oversized_degree() {
        let huge = usize::MAX / 2 + 1;
        assert_eq!(
            TreeConfig::new(huge, Variant::BTree).validate(),
            Err(BTreeError::InvalidOrder(huge))
        );
        assert_eq!(
            TreeConfig::from_json(&format!(r#"{{"min_degree": {huge}}}"#)),
            Err(BTreeError::InvalidOrder(huge))
        );

        let largest = TreeConfig::new(usize::MAX / 2, Variant::BPlusTree);
        assert!(largest.validate().is_ok());
        assert_eq!(largest.max_keys(), usize::MAX - 2);
    }

    #[test]
    fn test_from_json() {
        let config = TreeConfig::from_json(r#"{"min_degree": 3, "variant": "b_tree"}"#).unwrap();
        assert_eq!(config, TreeConfig::new(3, Variant::BTree));

        // Missing fields take defaults
        let config = TreeConfig::from_json(r#"{"min_degree": 4}"#).unwrap();
        assert_eq!(config.variant, Variant::BPlusTree);

        assert_eq!(
            TreeConfig::from_json(r#"{"min_degree": 1}"#),
            Err(BTreeError::InvalidOrder(1))
        );
        assert!(matches!(
            TreeConfig::from_json("not json"),
            Err(BTreeError::InvalidConfig(_))
        ));
        assert!(matches!(
            TreeConfig::from_json(r#"{"variant": "skip_list"}"#),
            Err(BTreeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_variant_policy() {
        assert!(Variant::BPlusTree.stores_values_in_leaves_only());
        assert!(!Variant::BTree.stores_values_in_leaves_only());
    }
}
