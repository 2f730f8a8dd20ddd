//! The five reusable pipeline stages.
//!
//! Each stage is stateless aside from its configuration and shared
//! behind an `Arc`; per-resource chains differ only in linkage.

mod authorization;
mod call;
mod constraint;
mod mechanisms;
mod token;

pub use authorization::AuthorizationStage;
pub use call::AuthenticationCallStage;
pub use constraint::AuthRequiredConstraintStage;
pub use mechanisms::MechanismRegistrationStage;
pub use token::TokenInjectionStage;
