//! XML utilities for navigating bulletin documents.

mod utils;

pub use utils::{
    find_all_by_path, find_by_path, find_child, find_children, required_text, IERS_NAMESPACE,
};
