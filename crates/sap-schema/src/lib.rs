#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # sap-schema
//!
//! Builds input and output element schemas for BAPIs, RFCs and IDOC types
//! from remote metadata, and serializes them as XSD for the interface
//! publisher.

pub mod control;
pub mod datatype;
pub mod descriptor;
pub mod generator;
pub mod model;
pub mod xsd;

pub use descriptor::MethodDescriptor;
pub use generator::{GeneratedSchema, SchemaBuilder, SchemaGenerator, function_schema, idoc_schema};
pub use model::{
    AttributeDecl, ComplexType, Compositor, Element, ElementType, Facet, MaxOccurs, Primitive,
    Restriction, SchemaDocument, Sequence, SimpleType, xml_name,
};

use thiserror::Error;

/// Errors raised while generating schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Metadata(#[from] sap_metadata::Error),

    #[error("Schema generation failed: {0}")]
    SchemaGeneration(String),
}

impl Error {
    pub fn generation(message: impl Into<String>) -> Self {
        Self::SchemaGeneration(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Metadata(inner) => inner.code(),
            Self::SchemaGeneration(_) => "SCHEMA_GENERATION",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
