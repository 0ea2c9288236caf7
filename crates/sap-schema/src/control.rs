//! The IDOC control record (`EDI_DC40`)

use crate::model::{
    AttributeDecl, ComplexType, Element, Facet, Primitive, Restriction, Sequence, SimpleType,
};

pub const CONTROL_RECORD: &str = "EDI_DC40";
pub const SEGMENT_ATTRIBUTE: &str = "SEGMENT";

/// Control record fields and their maximum lengths, in record order
pub const CONTROL_FIELDS: [(&str, u32); 36] = [
    ("TABNAM", 10),
    ("MANDT", 3),
    ("DOCNUM", 16),
    ("DOCREL", 4),
    ("STATUS", 2),
    ("DIRECT", 1),
    ("OUTMOD", 1),
    ("EXPRSS", 1),
    ("TEST", 1),
    ("IDOCTYP", 30),
    ("CIMTYP", 30),
    ("MESTYP", 30),
    ("MESCOD", 3),
    ("MESFCT", 3),
    ("STD", 1),
    ("STDVRS", 6),
    ("STDMES", 6),
    ("SNDPOR", 10),
    ("SNDPRT", 2),
    ("SNDPFC", 2),
    ("SNDPRN", 10),
    ("SNDSAD", 21),
    ("SNDLAD", 70),
    ("RCVPOR", 10),
    ("RCVPRT", 2),
    ("RCVPFC", 2),
    ("RCVPRN", 10),
    ("RCVSAD", 21),
    ("RCVLAD", 70),
    ("CREDAT", 8),
    ("CRETIM", 6),
    ("REFINT", 14),
    ("REFGRP", 14),
    ("REFMES", 14),
    ("ARCKEY", 70),
    ("SERIAL", 20),
];

const REQUIRED_FIELDS: [&str; 9] = [
    "TABNAM", "DIRECT", "IDOCTYP", "MESTYP", "SNDPOR", "SNDPRT", "SNDPRN", "RCVPOR", "RCVPRN",
];

/// The fixed `SEGMENT="1"` attribute carried by every segment
pub fn segment_attribute() -> AttributeDecl {
    AttributeDecl {
        name: SEGMENT_ATTRIBUTE.to_string(),
        simple_type: SimpleType::enumeration(&["1"]),
        required: true,
    }
}

/// Named complex type of the control record
pub fn control_record_type() -> ComplexType {
    let elements = CONTROL_FIELDS
        .iter()
        .map(|&(name, length)| {
            let simple_type = match name {
                "DIRECT" => SimpleType::enumeration(&["1", "2"]),
                _ => SimpleType::new(
                    Restriction::new(Primitive::String).with_facet(Facet::MaxLength(length)),
                ),
            };
            let element = Element::simple(name, simple_type);
            let element = if REQUIRED_FIELDS.contains(&name) {
                element
            } else {
                element.optional()
            };
            if name == "TABNAM" {
                element.fixed(CONTROL_RECORD)
            } else {
                element
            }
        })
        .collect();

    ComplexType::named(CONTROL_RECORD, Sequence::ordered(elements))
        .with_attribute(segment_attribute())
}
