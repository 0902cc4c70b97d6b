pub mod access_jwt;
pub mod factory;
pub mod principal;
pub mod resolver;
#[cfg(test)]
pub mod testing;
pub mod verifier;

pub use access_jwt::JwtVerifier;
pub use factory::build_principal_resolver;
pub use principal::Principal;
pub use resolver::PrincipalResolver;
pub use verifier::{TokenVerifier, VerificationError, VerifiedToken};
