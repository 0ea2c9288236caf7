//! Generated schema model

use serde::Serialize;

/// Base types of simple type restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primitive {
    String,
    Decimal,
    Int,
    UnsignedByte,
    Double,
    Base64Binary,
}

impl Primitive {
    /// Local name in the XML Schema namespace
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Decimal => "decimal",
            Primitive::Int => "int",
            Primitive::UnsignedByte => "unsignedByte",
            Primitive::Double => "double",
            Primitive::Base64Binary => "base64Binary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Facet {
    MaxLength(u32),
    Length(u32),
    TotalDigits(u32),
    FractionDigits(u32),
    Pattern(String),
    Enumeration(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restriction {
    pub base: Primitive,
    pub facets: Vec<Facet>,
}

impl Restriction {
    pub fn new(base: Primitive) -> Self {
        Self {
            base,
            facets: Vec::new(),
        }
    }

    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    pub fn has_facet(&self, facet: &Facet) -> bool {
        self.facets.contains(facet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleType {
    pub restriction: Restriction,
}

impl SimpleType {
    pub fn new(restriction: Restriction) -> Self {
        Self { restriction }
    }

    /// Bare primitive without facets
    pub fn primitive(base: Primitive) -> Self {
        Self::new(Restriction::new(base))
    }

    pub fn enumeration(values: &[&str]) -> Self {
        Self::new(Restriction::new(Primitive::String).with_facet(Facet::Enumeration(
            values.iter().map(|value| value.to_string()).collect(),
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaxOccurs {
    Bounded(u64),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compositor {
    Sequence,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub compositor: Compositor,
    pub elements: Vec<Element>,
}

impl Sequence {
    pub fn ordered(elements: Vec<Element>) -> Self {
        Self {
            compositor: Compositor::Sequence,
            elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDecl {
    pub name: String,
    pub simple_type: SimpleType,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexType {
    /// `None` for anonymous types declared inline
    pub name: Option<String>,
    pub content: Sequence,
    pub attributes: Vec<AttributeDecl>,
}

impl ComplexType {
    pub fn named(name: impl Into<String>, content: Sequence) -> Self {
        Self {
            name: Some(name.into()),
            content,
            attributes: Vec::new(),
        }
    }

    pub fn anonymous(content: Sequence) -> Self {
        Self {
            name: None,
            content,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ElementType {
    /// Reference to a named complex type of the document
    Named(String),
    Simple(SimpleType),
    Complex(Box<ComplexType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    pub element_type: ElementType,
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub fixed: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
            fixed: None,
        }
    }

    pub fn simple(name: impl Into<String>, simple_type: SimpleType) -> Self {
        Self::new(name, ElementType::Simple(simple_type))
    }

    pub fn complex(name: impl Into<String>, complex_type: ComplexType) -> Self {
        Self::new(name, ElementType::Complex(Box::new(complex_type)))
    }

    pub fn occurs(mut self, min: u64, max: MaxOccurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn optional(self) -> Self {
        let max = self.max_occurs;
        self.occurs(0, max)
    }

    pub fn fixed(mut self, value: impl Into<String>) -> Self {
        self.fixed = Some(value.into());
        self
    }

    /// Inline complex type, if any
    pub fn complex_type(&self) -> Option<&ComplexType> {
        match &self.element_type {
            ElementType::Complex(complex) => Some(complex.as_ref()),
            _ => None,
        }
    }
}

/// One schema document: top-level elements and the named complex types
/// they reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDocument {
    pub target_namespace: Option<String>,
    pub elements: Vec<Element>,
    pub complex_types: Vec<ComplexType>,
}

impl SchemaDocument {
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.name == name)
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types
            .iter()
            .find(|complex| complex.name.as_deref() == Some(name))
    }

    /// Every simple type restriction declared in the document
    pub fn restrictions(&self) -> Vec<&Restriction> {
        let mut found = Vec::new();
        for element in &self.elements {
            collect_element(element, &mut found);
        }
        for complex in &self.complex_types {
            collect_complex(complex, &mut found);
        }
        found
    }
}

fn collect_element<'a>(element: &'a Element, found: &mut Vec<&'a Restriction>) {
    match &element.element_type {
        ElementType::Simple(simple) => found.push(&simple.restriction),
        ElementType::Complex(complex) => collect_complex(complex, found),
        ElementType::Named(_) => {}
    }
}

fn collect_complex<'a>(complex: &'a ComplexType, found: &mut Vec<&'a Restriction>) {
    for element in &complex.content.elements {
        collect_element(element, found);
    }
    for attribute in &complex.attributes {
        found.push(&attribute.simple_type.restriction);
    }
}

/// Element or type name for an SAP name: the namespace separator `/` is
/// not valid in XML names and becomes `_-`
pub fn xml_name(sap_name: &str) -> String {
    sap_name.replace('/', "_-")
}
