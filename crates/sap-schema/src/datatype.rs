//! Remote type codes to schema restrictions
//!
//! Function parameters report one-letter ABAP type codes (`C`, `N`, `P`,
//! ...), dictionary fields and IDOC segments report dictionary type names
//! (`CHAR`, `NUMC`, `QUAN`, ...). Both code sets map through one table.

use crate::model::{Facet, Primitive, Restriction, SimpleType};

pub const DIGITS_PATTERN: &str = r"\d+";
pub const DATE_PATTERN: &str = "....-..-..";
pub const TIME_PATTERN: &str = "..-..-..";

/// Where a field is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContext {
    /// Function parameter or structure component
    Function,
    /// Field of an IDOC segment
    IdocSegment,
}

/// Simple type for a field of the given remote type
pub fn simple_type(
    data_type: &str,
    length: u32,
    decimals: u32,
    context: FieldContext,
) -> SimpleType {
    SimpleType::new(restriction(data_type, length, decimals, context))
}

pub fn restriction(
    data_type: &str,
    length: u32,
    decimals: u32,
    context: FieldContext,
) -> Restriction {
    match data_type.trim() {
        "NUM" | "N" | "NUMC" | "ACCP" | "PREC" => Restriction::new(Primitive::String)
            .with_facet(Facet::Pattern(DIGITS_PATTERN.to_string()))
            .with_facet(Facet::MaxLength(length)),
        "BCD" | "P" | "QUAN" | "CURR" | "DEC" => Restriction::new(Primitive::Decimal)
            .with_facet(Facet::TotalDigits(length))
            .with_facet(Facet::FractionDigits(decimals)),
        // Segment dates are plain 8-character strings
        "DATS" if context == FieldContext::IdocSegment => {
            Restriction::new(Primitive::String).with_facet(Facet::MaxLength(8))
        }
        "DATE" | "D" | "DATS" => {
            Restriction::new(Primitive::String).with_facet(Facet::Pattern(DATE_PATTERN.to_string()))
        }
        "TIME" | "T" | "TIMS" => {
            Restriction::new(Primitive::String).with_facet(Facet::Pattern(TIME_PATTERN.to_string()))
        }
        "INT" | "INT2" | "INT4" | "I" | "s" => Restriction::new(Primitive::Int),
        "INT1" | "b" => Restriction::new(Primitive::UnsignedByte),
        "FLOAT" | "F" | "FLTP" => Restriction::new(Primitive::Double),
        "BYTE" | "XSTRING" | "X" | "RAW" | "LRAW" | "RAWSTRING" | "y" => {
            with_length(Restriction::new(Primitive::Base64Binary), Facet::Length, length)
        }
        "CHAR" | "STRING" | "C" | "UNIT" | "CUKY" | "LANG" | "CLNT" | "g" => {
            with_length(Restriction::new(Primitive::String), Facet::MaxLength, length)
        }
        _ => Restriction::new(Primitive::String),
    }
}

/// Variable-length types report no length; they get no length facet
fn with_length(restriction: Restriction, facet: fn(u32) -> Facet, length: u32) -> Restriction {
    if length == 0 {
        restriction
    } else {
        restriction.with_facet(facet(length))
    }
}
