//! Normalization and cross-reference engine

pub mod catalog;
pub mod entity;
pub mod iam;
pub mod model;
pub mod normalize;
pub mod resolver;
