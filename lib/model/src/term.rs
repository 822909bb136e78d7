use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{self, AtomicU32};

/// The name of the undistinguished, non-shared variable.
pub const BLANK_VARIABLE_NAME: &str = "_";

/// The type of the values a term can be bound to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermType {
    /// Not known yet. Variables start with this type until they occur in a typed position.
    #[default]
    Undefined,
    /// Individuals, identified by IRIs.
    Object,
    /// Literal values.
    Data,
}

impl Display for TermType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TermType::Undefined => "undefined",
            TermType::Object => "object",
            TermType::Data => "data",
        })
    }
}

/// Identifies the query that owns a set of variables.
///
/// Two variables with the same name are only equal if they belong to the same scope (or both
/// belong to no scope at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryScope(u32);

impl QueryScope {
    /// Allocates a scope that is distinct from every scope allocated before.
    pub fn fresh() -> Self {
        static NEXT_SCOPE: AtomicU32 = AtomicU32::new(0);
        Self(NEXT_SCOPE.fetch_add(1, atomic::Ordering::Relaxed))
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// A FOL variable.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    term_type: TermType,
    scope: Option<QueryScope>,
}

impl Variable {
    /// Creates a new [Variable] that does not belong to any query.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            term_type: TermType::Undefined,
            scope: None,
        }
    }

    /// Creates a new blank (undistinguished, non-shared) variable.
    pub fn blank() -> Self {
        Self::new(BLANK_VARIABLE_NAME)
    }

    #[must_use]
    pub fn with_type(mut self, term_type: TermType) -> Self {
        self.term_type = term_type;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: QueryScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Returns a variable with the same type and scope but another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            term_type: self.term_type,
            scope: self.scope,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn term_type(&self) -> TermType {
        self.term_type
    }

    pub fn scope(&self) -> Option<QueryScope> {
        self.scope
    }

    /// Whether this is the blank variable `_`.
    pub fn is_blank(&self) -> bool {
        self.name == BLANK_VARIABLE_NAME
    }

    pub(crate) fn set_term_type(&mut self, term_type: TermType) {
        self.term_type = term_type;
    }

    pub fn to_sparql(&self) -> String {
        format!("?{}", self.name)
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.scope == other.scope
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.scope.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.scope.cmp(&other.scope))
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The datatypes a [DataConstant] can have.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Boolean,
    DateTime,
    Decimal,
    Float,
    Integer,
    Int,
    #[default]
    String,
}

impl Datatype {
    pub const ALL: [Datatype; 7] = [
        Datatype::Boolean,
        Datatype::DateTime,
        Datatype::Decimal,
        Datatype::Float,
        Datatype::Integer,
        Datatype::Int,
        Datatype::String,
    ];

    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Datatype::Boolean => xsd::BOOLEAN,
            Datatype::DateTime => xsd::DATE_TIME,
            Datatype::Decimal => xsd::DECIMAL,
            Datatype::Float => xsd::FLOAT,
            Datatype::Integer => xsd::INTEGER,
            Datatype::Int => xsd::INT,
            Datatype::String => xsd::STRING,
        }
    }

    /// The local name in the XSD namespace, e.g. `dateTime`.
    pub fn short_name(self) -> &'static str {
        match self {
            Datatype::Boolean => "boolean",
            Datatype::DateTime => "dateTime",
            Datatype::Decimal => "decimal",
            Datatype::Float => "float",
            Datatype::Integer => "integer",
            Datatype::Int => "int",
            Datatype::String => "string",
        }
    }

    /// Resolves either a full XSD IRI or a `xsd:` prefixed name.
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|datatype| {
            datatype.iri().as_str() == iri
                || iri
                    .strip_prefix("xsd:")
                    .is_some_and(|local| local == datatype.short_name())
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Datatype::Decimal | Datatype::Float | Datatype::Integer | Datatype::Int
        )
    }
}

/// A constant denoting an individual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectConstant {
    iri: String,
}

impl ObjectConstant {
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn to_sparql(&self) -> String {
        NamedNodeRef::new_unchecked(&self.iri).to_string()
    }

    pub fn to_sql(&self) -> String {
        quote_sql_string(&self.iri)
    }
}

impl Display for ObjectConstant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.iri)
    }
}

/// A constant denoting a literal value.
///
/// Constants are identified by their lexical value only.
#[derive(Debug, Clone)]
pub struct DataConstant {
    value: String,
    datatype: Datatype,
}

impl DataConstant {
    pub fn new(value: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            value: value.into(),
            datatype,
        }
    }

    /// Creates a new `xsd:string` [DataConstant].
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(value, Datatype::String)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn to_sparql(&self) -> String {
        Literal::new_typed_literal(self.value.as_str(), self.datatype.iri()).to_string()
    }

    pub fn to_sql(&self) -> String {
        match self.datatype {
            Datatype::Boolean if self.value.eq_ignore_ascii_case("true") => "TRUE".to_owned(),
            Datatype::Boolean => "FALSE".to_owned(),
            datatype if datatype.is_numeric() => self.value.clone(),
            _ => quote_sql_string(&self.value),
        }
    }
}

impl PartialEq for DataConstant {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for DataConstant {}

impl Hash for DataConstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Display for DataConstant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.datatype.is_numeric() || self.datatype == Datatype::Boolean {
            f.write_str(&self.value)
        } else {
            write!(f, "\"{}\"", self.value)
        }
    }
}

fn quote_sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A term of a FOL formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Variable(Variable),
    Object(ObjectConstant),
    Data(DataConstant),
}

impl Term {
    pub fn term_type(&self) -> TermType {
        match self {
            Term::Variable(variable) => variable.term_type(),
            Term::Object(_) => TermType::Object,
            Term::Data(_) => TermType::Data,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        !self.is_variable()
    }

    pub fn to_sparql(&self) -> String {
        match self {
            Term::Variable(variable) => variable.to_sparql(),
            Term::Object(constant) => constant.to_sparql(),
            Term::Data(constant) => constant.to_sparql(),
        }
    }

    /// Renders the term as an SQL expression. Variables are rendered by name.
    pub fn to_sql(&self) -> String {
        match self {
            Term::Variable(variable) => variable.name().to_owned(),
            Term::Object(constant) => constant.to_sql(),
            Term::Data(constant) => constant.to_sql(),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(variable) => variable.fmt(f),
            Term::Object(constant) => constant.fmt(f),
            Term::Data(constant) => constant.fmt(f),
        }
    }
}

impl From<Variable> for Term {
    fn from(variable: Variable) -> Self {
        Term::Variable(variable)
    }
}

impl From<ObjectConstant> for Term {
    fn from(constant: ObjectConstant) -> Self {
        Term::Object(constant)
    }
}

impl From<DataConstant> for Term {
    fn from(constant: DataConstant) -> Self {
        Term::Data(constant)
    }
}
