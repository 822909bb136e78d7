use fol_query_model::ModelError;
use oxiri::IriParseError;

pub type ParseResult<T> = Result<T, ParseError>;

/// An error raised while parsing a Datalog query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The input contains a character sequence that is not a token.
    #[error("Unexpected input at position {position}: {text:?}")]
    Lexer { position: usize, text: String },
    /// A token that does not fit the grammar.
    #[error("Expected {expected} at position {position} but found {found:?}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("\"{0}\" is not a valid name for a variable.")]
    InvalidVariable(String),
    #[error("{iri} is not a valid object constant: {source}")]
    InvalidIri {
        iri: String,
        #[source]
        source: IriParseError,
    },
    /// The signature does not know the predicate.
    #[error("No element can be found in the signature for the predicate {0}")]
    UnknownPredicate(String),
    #[error("The head variable {0} does not occur in the body of the query.")]
    UnboundHeadVariable(String),
    /// The parsed atom violates the arity or the term types of its predicate.
    #[error(transparent)]
    Model(#[from] ModelError),
}
