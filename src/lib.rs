//! Ordered multiway search trees for in-memory indexing.
//!
//! A single [`BTree`] type covers both classic layouts:
//! - [`Variant::BTree`] keeps payloads next to their keys in every node
//! - [`Variant::BPlusTree`] keeps payloads in leaves and links the leaves,
//!   so range scans walk sideways instead of re-descending
//!
//! ```
//! use multiway_btree::{BTree, TreeConfig, Variant};
//!
//! let mut tree = BTree::with_config(TreeConfig::new(2, Variant::BPlusTree))?;
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     tree.insert(key, key * 100)?;
//! }
//!
//! assert_eq!(tree.search(&12), Some(&1200));
//! let keys: Vec<_> = tree.range(&5, &12)?.map(|(k, _)| *k).collect();
//! assert_eq!(keys, vec![5, 6, 7, 10, 12]);
//! # Ok::<(), multiway_btree::BTreeError>(())
//! ```

pub mod btree;

pub use btree::{
    BTree, BTreeError, BTreeResult, DEFAULT_MIN_DEGREE, Range, TreeConfig, TreeStats, Variant,
};
