//! Trust-policy reading for IAM roles
//!
//! Provides the narrow slice of IAM policy evaluation needed to answer
//! "which roles can this user assume":
//! - `Effect` must be exactly `Allow`
//! - `Principal.AWS` normalized from a string or a list
//! - Exact ARN or `*` wildcard matching
//!
//! There is no deny precedence, condition evaluation or resource matching.

mod policy;

pub use policy::{AwsPrincipal, Effect, TrustPolicy, TrustStatement, WILDCARD_PRINCIPAL};
