//! Trust policy document view
//!
//! A role's `AssumeRolePolicyDocument` is kept as raw JSON on the role. This
//! module reads it leniently: anything structurally unexpected simply fails
//! to match instead of raising an error. Only `Effect` and `Principal.AWS`
//! are interpreted; conditions, actions and other principal types are not.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Principal that admits any AWS identity
pub const WILDCARD_PRINCIPAL: &str = "*";

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action (skipped when listing assumable roles)
    Deny,
}

impl Effect {
    /// Parse an exact, case-sensitive `Effect` value
    pub fn parse(raw: &str) -> Option<Effect> {
        match raw {
            "Allow" => Some(Effect::Allow),
            "Deny" => Some(Effect::Deny),
            _ => None,
        }
    }
}

/// `Principal.AWS` of a statement, either one ARN or a list of them
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AwsPrincipal<'a> {
    /// Missing, or neither a string nor a list
    Absent,
    Single(&'a str),
    List(&'a [Value]),
}

impl<'a> AwsPrincipal<'a> {
    /// Read `Principal.AWS` out of a raw statement
    pub fn from_statement(statement: &'a Value) -> Self {
        match statement.get("Principal").and_then(|p| p.get("AWS")) {
            Some(Value::String(arn)) => AwsPrincipal::Single(arn),
            Some(Value::Array(arns)) => AwsPrincipal::List(arns),
            _ => AwsPrincipal::Absent,
        }
    }

    /// Principal strings in document order; non-string list entries are skipped
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + 'a {
        let (single, list): (Option<&'a str>, &'a [Value]) = match *self {
            AwsPrincipal::Absent => (None, &[]),
            AwsPrincipal::Single(arn) => (Some(arn), &[]),
            AwsPrincipal::List(arns) => (None, arns),
        };
        single
            .into_iter()
            .chain(list.iter().filter_map(Value::as_str))
    }

    /// Whether the principal names `arn` exactly or is the wildcard
    ///
    /// Stops at the first matching entry.
    pub fn admits(&self, arn: Option<&str>) -> bool {
        self.iter()
            .any(|principal| principal == WILDCARD_PRINCIPAL || Some(principal) == arn)
    }
}

/// One statement of a trust policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustStatement<'a> {
    /// `None` when `Effect` is missing or not exactly "Allow"/"Deny"
    pub effect: Option<Effect>,
    pub aws: AwsPrincipal<'a>,
}

impl<'a> TrustStatement<'a> {
    pub fn from_value(statement: &'a Value) -> Self {
        TrustStatement {
            effect: statement
                .get("Effect")
                .and_then(Value::as_str)
                .and_then(Effect::parse),
            aws: AwsPrincipal::from_statement(statement),
        }
    }

    /// Whether this statement lets `arn` assume the role
    pub fn allows(&self, arn: Option<&str>) -> bool {
        self.effect == Some(Effect::Allow) && self.aws.admits(arn)
    }
}

/// Lenient view over an `AssumeRolePolicyDocument`
#[derive(Debug, Clone, Copy)]
pub struct TrustPolicy<'a> {
    document: &'a Value,
}

impl<'a> TrustPolicy<'a> {
    pub fn new(document: &'a Value) -> Self {
        TrustPolicy { document }
    }

    /// Raw statement values
    ///
    /// `Statement` may be a list or a single object; anything else yields
    /// no statements.
    fn raw_statements(&self) -> &'a [Value] {
        match self.document.get("Statement") {
            Some(Value::Array(statements)) => statements,
            Some(statement) if statement.is_object() => std::slice::from_ref(statement),
            _ => &[],
        }
    }

    pub fn statements(&self) -> impl Iterator<Item = TrustStatement<'a>> + 'a {
        self.raw_statements().iter().map(TrustStatement::from_value)
    }

    /// Whether any Allow statement admits `arn`
    ///
    /// Deny statements are skipped, not treated as overrides.
    pub fn allows(&self, arn: Option<&str>) -> bool {
        self.statements().any(|statement| statement.allows(arn))
    }

    /// Whether any Allow statement uses the wildcard principal
    pub fn is_public(&self) -> bool {
        self.allows(None)
    }
}
