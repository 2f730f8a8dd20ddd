#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorizer plugins.
//!
//! Three authorizers cover the common deployments: [`FullAllower`]
//! (open access), [`RequestPredicateAllower`] (role-based ACL over
//! method and path), and [`IpBlocklistVetoer`] (deny-list by client
//! address). Allowers grant, vetoers deny; the pipeline's engine runs
//! vetoers first.

mod full;
mod ip_blocklist;
mod predicates;

pub use full::FullAllower;
pub use ip_blocklist::{IpBlocklistConfig, IpBlocklistVetoer};
pub use predicates::{
    PredicateError, PredicateRule, RequestPredicateAllower, RequestPredicatesConfig,
    UNAUTHENTICATED_ROLE,
};
