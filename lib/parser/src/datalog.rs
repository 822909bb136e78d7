use crate::lexer::{tokenize, Token};
use crate::{ConjunctiveQuery, ParseError, ParseResult};
use fol_query_model::{
    Atom, ComparisonAtom, DataConstant, Datatype, Formula, ObjectConstant, PredicateAtom,
    QueryScope, Signature, Term, Variable,
};
use oxiri::Iri;
use std::ops::Range;

const INEQUALITY_PREDICATE: &str = "_not_equal";
const NOT_PREDICATE: &str = "not";
const IRI_FUNCTION_PREFIX: &str = "IRI_FUNCT_";

/// Parses Datalog conjunctive queries such as `Q(x) :- C(x), R(x, y), y != x .`
///
/// Without a [Signature] the kind of every predicate is guessed from its arity and terms.
/// With a signature, predicates it does not know are rejected.
#[derive(Default, Clone, Copy)]
pub struct DatalogParser<'a> {
    signature: Option<&'a dyn Signature>,
}

impl<'a> DatalogParser<'a> {
    /// Creates a new [DatalogParser] without a signature.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_signature(mut self, signature: &'a dyn Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Parses a conjunctive query. Its variables are bound to a fresh [QueryScope].
    pub fn parse_query(&self, input: &str) -> ParseResult<ConjunctiveQuery> {
        let scope = QueryScope::fresh();
        let mut cursor = Cursor::new(input)?;

        let name = cursor.identifier("the query head")?;
        if name != "Q" && name != "q" {
            return Err(cursor.unexpected_previous("the query head Q"));
        }
        cursor.expect(&Token::OpenParen, "(")?;
        let mut head = Vec::new();
        if !cursor.eat(&Token::CloseParen) {
            loop {
                let name = cursor.identifier("a head variable")?;
                head.push(variable(&name, scope)?);
                if cursor.eat(&Token::CloseParen) {
                    break;
                }
                cursor.expect(&Token::Comma, ", or )")?;
            }
        }
        cursor.expect(&Token::Implies, ":-")?;

        let mut atoms = vec![self.atom(&mut cursor, scope)?];
        while cursor.eat(&Token::Comma) {
            atoms.push(self.atom(&mut cursor, scope)?);
        }
        cursor.expect(&Token::Dot, ". or ,")?;
        cursor.end()?;

        let mut body = Formula::and(atoms.into_iter().map(Formula::from).collect());
        body.infer_variable_types();
        let free = body.free_variables();
        if let Some(unbound) = head.iter().find(|variable| !free.contains(*variable)) {
            return Err(ParseError::UnboundHeadVariable(unbound.to_string()));
        }
        let atoms = body.atoms().into_iter().cloned().collect();

        let query = ConjunctiveQuery::new(head, atoms, scope);
        tracing::debug!("Parsed query {query}");
        Ok(query)
    }

    fn atom(&self, cursor: &mut Cursor<'_>, scope: QueryScope) -> ParseResult<Atom> {
        let followed_by_paren = cursor.peek_nth(1) == Some(&Token::OpenParen);
        match cursor.peek() {
            Some(Token::Identifier(name)) if followed_by_paren && name == NOT_PREDICATE => {
                cursor.advance();
                cursor.expect(&Token::OpenParen, "(")?;
                let left = term(cursor, scope)?;
                cursor.expect(&Token::Equal, "=")?;
                let right = term(cursor, scope)?;
                cursor.expect(&Token::CloseParen, ")")?;
                Ok(Atom::Comparison(ComparisonAtom::not_equal(left, right)))
            }
            Some(Token::Identifier(name)) if followed_by_paren && name == INEQUALITY_PREDICATE => {
                cursor.advance();
                cursor.expect(&Token::OpenParen, "(")?;
                let left = term(cursor, scope)?;
                cursor.expect(&Token::Comma, ",")?;
                let right = term(cursor, scope)?;
                cursor.expect(&Token::CloseParen, ")")?;
                Ok(Atom::Comparison(ComparisonAtom::not_equal(left, right)))
            }
            Some(Token::Identifier(name))
                if followed_by_paren && !name.starts_with(IRI_FUNCTION_PREFIX) =>
            {
                let predicate = name.clone();
                cursor.advance();
                self.predicate_atom(predicate, cursor, scope)
            }
            Some(Token::Iri(iri)) if followed_by_paren => {
                let predicate = iri.clone();
                cursor.advance();
                self.predicate_atom(predicate, cursor, scope)
            }
            _ => {
                let left = term(cursor, scope)?;
                let comparison = match cursor.next("= or !=")? {
                    Token::Equal => ComparisonAtom::equal,
                    Token::NotEqual => ComparisonAtom::not_equal,
                    _ => return Err(cursor.unexpected_previous("= or !=")),
                };
                let right = term(cursor, scope)?;
                Ok(Atom::Comparison(comparison(left, right)))
            }
        }
    }

    fn predicate_atom(
        &self,
        predicate: String,
        cursor: &mut Cursor<'_>,
        scope: QueryScope,
    ) -> ParseResult<Atom> {
        cursor.expect(&Token::OpenParen, "(")?;
        let mut terms = vec![term(cursor, scope)?];
        while cursor.eat(&Token::Comma) {
            terms.push(term(cursor, scope)?);
        }
        cursor.expect(&Token::CloseParen, ", or )")?;

        let atom = match self.signature {
            Some(signature) => {
                let kind = signature
                    .predicate_kind(&predicate)
                    .ok_or_else(|| ParseError::UnknownPredicate(predicate.clone()))?;
                PredicateAtom::with_kind(predicate, terms, kind)?
            }
            None => PredicateAtom::classified(predicate, terms)?,
        };
        Ok(Atom::Predicate(atom))
    }
}

fn term(cursor: &mut Cursor<'_>, scope: QueryScope) -> ParseResult<Term> {
    Ok(match cursor.next("a term")? {
        Token::Identifier(name) if name.starts_with(IRI_FUNCTION_PREFIX) => {
            cursor.expect(&Token::OpenParen, "(")?;
            let iri = match cursor.next("a quoted IRI")? {
                Token::String(iri) => iri,
                _ => return Err(cursor.unexpected_previous("a quoted IRI")),
            };
            cursor.expect(&Token::CloseParen, ")")?;
            object_constant(iri)?
        }
        Token::Identifier(name) if name == "true" || name == "false" => {
            DataConstant::new(name, Datatype::Boolean).into()
        }
        Token::Identifier(name) => variable(&name, scope)?.into(),
        Token::Iri(iri) => object_constant(iri)?,
        Token::Integer(value) => DataConstant::new(value, Datatype::Integer).into(),
        Token::Decimal(value) => DataConstant::new(value, Datatype::Decimal).into(),
        Token::String(value) => DataConstant::string(value).into(),
        _ => return Err(cursor.unexpected_previous("a term")),
    })
}

fn object_constant(iri: String) -> ParseResult<Term> {
    let parsed = Iri::parse(iri.as_str()).map(|_| ());
    match parsed {
        Ok(()) => Ok(ObjectConstant::new(iri).into()),
        Err(source) => Err(ParseError::InvalidIri { iri, source }),
    }
}

/// Checks that `name` is either `_` or a letter followed by word characters.
fn variable(name: &str, scope: QueryScope) -> ParseResult<Variable> {
    let mut chars = name.chars();
    let valid = name == "_"
        || (chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if valid {
        Ok(Variable::new(name).with_scope(scope))
    } else {
        Err(ParseError::InvalidVariable(name.to_owned()))
    }
}

struct Cursor<'a> {
    input: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> ParseResult<Self> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            position: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n).map(|(token, _)| token)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn next(&mut self, expected: &'static str) -> ParseResult<Token> {
        let token = self
            .peek()
            .cloned()
            .ok_or(ParseError::UnexpectedEnd { expected })?;
        self.advance();
        Ok(token)
    }

    /// Consumes the next token if it is `token`.
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> ParseResult<()> {
        match self.peek() {
            Some(next) if next == token => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(self.unexpected_at(self.position, expected)),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn identifier(&mut self, expected: &'static str) -> ParseResult<String> {
        match self.next(expected)? {
            Token::Identifier(name) => Ok(name),
            _ => Err(self.unexpected_previous(expected)),
        }
    }

    fn end(&self) -> ParseResult<()> {
        if self.position < self.tokens.len() {
            return Err(self.unexpected_at(self.position, "the end of the query"));
        }
        Ok(())
    }

    /// Reports the token that was consumed last as unexpected.
    fn unexpected_previous(&self, expected: &'static str) -> ParseError {
        self.unexpected_at(self.position.saturating_sub(1), expected)
    }

    fn unexpected_at(&self, index: usize, expected: &'static str) -> ParseError {
        match self.tokens.get(index) {
            Some((_, span)) => ParseError::UnexpectedToken {
                expected,
                found: self.input[span.clone()].to_owned(),
                position: span.start,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }
}
