mod lexer;

use std::iter::Peekable;

use crate::expr::{Error, Expr};
use self::lexer::{Lexer, Token};

/// Read exactly one top-level form.
pub fn read(input: &str) -> Result<Expr, Error> {
    Reader::new(input).read_expr()
}

/// Recursive-descent reader over the token stream. Every peek and pop is
/// checked, so running out of tokens mid-form is a typed failure rather than
/// an out-of-bounds access.
pub struct Reader<'a> {
    tokens: Peekable<Lexer<'a>>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Reader<'a> {
        Reader {
            tokens: Lexer::new(input).peekable(),
        }
    }

    pub fn read_expr(&mut self) -> Result<Expr, Error> {
        match self.tokens.next() {
            None => Err(Error::UnexpectedEof),
            Some(Token::LeftParen) => self.read_list(),
            Some(Token::RightParen) => Err(Error::UnmatchedCloseParen),
            Some(Token::Atom(text)) => Ok(atom(&text)),
        }
    }

    fn read_list(&mut self) -> Result<Expr, Error> {
        let mut items = Vec::new();
        loop {
            match self.tokens.peek() {
                None => return Err(Error::UnexpectedEof),
                Some(Token::RightParen) => {
                    self.tokens.next();
                    return Ok(Expr::list(items));
                }
                Some(_) => items.push(self.read_expr()?),
            }
        }
    }
}

/// Classify one non-parenthesis token. Numeric parsing is attempted first;
/// any token that is not `#t`, `#f`, or a valid float literal is a symbol
/// carrying the token's exact text.
fn atom(token: &str) -> Expr {
    match token {
        "#t" => return Expr::boolean(true),
        "#f" => return Expr::boolean(false),
        _ => {}
    }
    match token.parse::<f64>() {
        Ok(n) => Expr::number(n),
        Err(_) => Expr::symbol(token),
    }
}

#[cfg(test)]
mod test {
    use crate::equality::ExprEq;
    use crate::expr::{Error, Expr};
    use super::{atom, read, Reader};

    #[test]
    fn test_read_0() {
        read("0").unwrap();
    }

    #[test]
    fn test_atom_classification() {
        assert_eq!(atom("12"), Expr::number(12.0));
        assert_eq!(atom("-4.5"), Expr::number(-4.5));
        assert_eq!(atom("1e3"), Expr::number(1000.0));
        assert_eq!(atom("1.2.3"), Expr::symbol("1.2.3"));
        assert_eq!(atom("+"), Expr::symbol("+"));
        assert_eq!(atom("#t"), Expr::boolean(true));
        assert_eq!(atom("#f"), Expr::boolean(false));
    }

    #[test]
    fn test_read_program_structure() {
        let expr = read("(begin (define r 10) (* pi (* r r)))").unwrap();
        let items = expr.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_symbol(), Some("begin"));
    }

    #[test]
    fn test_unterminated_list() {
        assert_eq!(read("(+ 1"), Err(Error::UnexpectedEof));
        assert_eq!(read("(+ (list 1 2)"), Err(Error::UnexpectedEof));
        assert_eq!(read(""), Err(Error::UnexpectedEof));
    }

    #[test]
    fn test_unmatched_close_paren() {
        assert_eq!(read(")"), Err(Error::UnmatchedCloseParen));
    }

    #[test]
    fn test_reader_leaves_remaining_tokens() {
        let mut reader = Reader::new("(+ 1 2) (- 3 4)");
        assert!(reader.read_expr().is_ok());
        assert!(reader.read_expr().is_ok());
        assert_eq!(reader.read_expr(), Err(Error::UnexpectedEof));
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let inputs = ["x", "12", "(  )", "(+ 1 2)", "(#t #f 1.5 sym)",
            "(begin (define r 10) (* pi (* r r)))"];
        for input in inputs.iter() {
            let first = read(input).unwrap();
            let second = read(&first.to_string()).unwrap();
            assert!(first.equal(&second), "round trip changed {:?}", input);
        }
    }
}
