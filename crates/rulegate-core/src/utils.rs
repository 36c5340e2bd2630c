//! Utility modules for rule implementations.

pub mod allowance;
pub mod attributes;

#[doc(inline)]
pub use allowance::{check_allow_with_reason, AllowCheck, InlineAllow};
#[doc(inline)]
pub use attributes::{has_allow_attr, has_cfg_test, has_test_attr};
