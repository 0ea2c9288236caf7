//! XSD serialization of generated schemas

use crate::model::{
    AttributeDecl, ComplexType, Compositor, Element, ElementType, Facet, MaxOccurs, Restriction,
    SchemaDocument, SimpleType,
};
use crate::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const PREFIX: &str = "xsd";

type XsdWriter = Writer<Vec<u8>>;

/// Serialize a schema document as an indented XSD string
pub fn to_xsd_string(document: &SchemaDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut schema = BytesStart::new(tag("schema"));
    schema.push_attribute(("xmlns:xsd", XSD_NAMESPACE));
    if let Some(namespace) = &document.target_namespace {
        schema.push_attribute(("targetNamespace", namespace.as_str()));
        schema.push_attribute(("xmlns", namespace.as_str()));
    }
    schema.push_attribute(("elementFormDefault", "qualified"));
    write(&mut writer, Event::Start(schema))?;

    for element in &document.elements {
        write_element(&mut writer, element)?;
    }
    for complex in &document.complex_types {
        write_complex(&mut writer, complex)?;
    }

    write(&mut writer, Event::End(BytesEnd::new(tag("schema"))))?;
    String::from_utf8(writer.into_inner()).map_err(|e| Error::generation(e.to_string()))
}

fn tag(local: &str) -> String {
    format!("{PREFIX}:{local}")
}

fn write(writer: &mut XsdWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::generation(format!("XSD serialization failed: {e}")))
}

fn write_element(writer: &mut XsdWriter, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(tag("element"));
    start.push_attribute(("name", element.name.as_str()));

    let inline_simple = match &element.element_type {
        ElementType::Named(type_name) => {
            start.push_attribute(("type", type_name.as_str()));
            None
        }
        ElementType::Simple(simple) if simple.restriction.facets.is_empty() => {
            start.push_attribute(("type", tag(simple.restriction.base.as_str()).as_str()));
            None
        }
        ElementType::Simple(simple) => Some(simple),
        ElementType::Complex(_) => None,
    };

    if element.min_occurs != 1 {
        start.push_attribute(("minOccurs", element.min_occurs.to_string().as_str()));
    }
    match element.max_occurs {
        MaxOccurs::Bounded(1) => {}
        MaxOccurs::Bounded(max) => start.push_attribute(("maxOccurs", max.to_string().as_str())),
        MaxOccurs::Unbounded => start.push_attribute(("maxOccurs", "unbounded")),
    }
    if let Some(fixed) = &element.fixed {
        start.push_attribute(("fixed", fixed.as_str()));
    }

    match (&element.element_type, inline_simple) {
        (_, Some(simple)) => {
            write(writer, Event::Start(start))?;
            write_simple(writer, simple)?;
            write(writer, Event::End(BytesEnd::new(tag("element"))))
        }
        (ElementType::Complex(complex), None) => {
            write(writer, Event::Start(start))?;
            write_complex(writer, complex)?;
            write(writer, Event::End(BytesEnd::new(tag("element"))))
        }
        _ => write(writer, Event::Empty(start)),
    }
}

fn write_complex(writer: &mut XsdWriter, complex: &ComplexType) -> Result<()> {
    let mut start = BytesStart::new(tag("complexType"));
    if let Some(name) = &complex.name {
        start.push_attribute(("name", name.as_str()));
    }
    write(writer, Event::Start(start))?;

    let compositor = match complex.content.compositor {
        Compositor::Sequence => tag("sequence"),
        Compositor::All => tag("all"),
    };
    if complex.content.elements.is_empty() {
        write(writer, Event::Empty(BytesStart::new(compositor.as_str())))?;
    } else {
        write(writer, Event::Start(BytesStart::new(compositor.as_str())))?;
        for element in &complex.content.elements {
            write_element(writer, element)?;
        }
        write(writer, Event::End(BytesEnd::new(compositor.as_str())))?;
    }

    for attribute in &complex.attributes {
        write_attribute(writer, attribute)?;
    }
    write(writer, Event::End(BytesEnd::new(tag("complexType"))))
}

fn write_attribute(writer: &mut XsdWriter, attribute: &AttributeDecl) -> Result<()> {
    let mut start = BytesStart::new(tag("attribute"));
    start.push_attribute(("name", attribute.name.as_str()));
    if attribute.required {
        start.push_attribute(("use", "required"));
    }
    write(writer, Event::Start(start))?;
    write_simple(writer, &attribute.simple_type)?;
    write(writer, Event::End(BytesEnd::new(tag("attribute"))))
}

fn write_simple(writer: &mut XsdWriter, simple: &SimpleType) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(tag("simpleType"))))?;
    write_restriction(writer, &simple.restriction)?;
    write(writer, Event::End(BytesEnd::new(tag("simpleType"))))
}

fn write_restriction(writer: &mut XsdWriter, restriction: &Restriction) -> Result<()> {
    let mut start = BytesStart::new(tag("restriction"));
    start.push_attribute(("base", tag(restriction.base.as_str()).as_str()));
    if restriction.facets.is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for facet in &restriction.facets {
        let (name, values): (&str, Vec<String>) = match facet {
            Facet::MaxLength(value) => ("maxLength", vec![value.to_string()]),
            Facet::Length(value) => ("length", vec![value.to_string()]),
            Facet::TotalDigits(value) => ("totalDigits", vec![value.to_string()]),
            Facet::FractionDigits(value) => ("fractionDigits", vec![value.to_string()]),
            Facet::Pattern(pattern) => ("pattern", vec![pattern.clone()]),
            Facet::Enumeration(values) => ("enumeration", values.clone()),
        };
        for value in values {
            let mut facet_start = BytesStart::new(tag(name));
            facet_start.push_attribute(("value", value.as_str()));
            write(writer, Event::Empty(facet_start))?;
        }
    }
    write(writer, Event::End(BytesEnd::new(tag("restriction"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Primitive, Sequence};

    #[test]
    fn writes_restrictions_and_occurrences() {
        let document = SchemaDocument {
            target_namespace: Some("urn:sap-com:document:sap:rfc:functions".to_string()),
            elements: vec![Element::complex(
                "RFC_READ_TABLE",
                ComplexType::anonymous(Sequence::ordered(vec![
                    Element::simple(
                        "QUERY_TABLE",
                        SimpleType::new(
                            Restriction::new(Primitive::String).with_facet(Facet::MaxLength(30)),
                        ),
                    ),
                    Element::simple("ROWCOUNT", SimpleType::primitive(Primitive::Int)).optional(),
                    Element::new("DATA", ElementType::Named("TAB512".to_string()))
                        .occurs(0, MaxOccurs::Unbounded),
                ])),
            )],
            complex_types: Vec::new(),
        };

        let xsd = to_xsd_string(&document).unwrap();

        assert!(xsd.contains(r#"targetNamespace="urn:sap-com:document:sap:rfc:functions""#));
        assert!(xsd.contains(r#"<xsd:maxLength value="30"/>"#));
        assert!(xsd.contains(r#"<xsd:element name="ROWCOUNT" type="xsd:int" minOccurs="0"/>"#));
        assert!(xsd.contains(
            r#"<xsd:element name="DATA" type="TAB512" minOccurs="0" maxOccurs="unbounded"/>"#
        ));
    }

    #[test]
    fn enumerations_write_one_facet_per_value() {
        let document = SchemaDocument {
            target_namespace: None,
            elements: vec![Element::simple("DIRECT", SimpleType::enumeration(&["1", "2"]))],
            complex_types: Vec::new(),
        };

        let xsd = to_xsd_string(&document).unwrap();
        assert!(xsd.contains(r#"<xsd:enumeration value="1"/>"#));
        assert!(xsd.contains(r#"<xsd:enumeration value="2"/>"#));
    }
}
