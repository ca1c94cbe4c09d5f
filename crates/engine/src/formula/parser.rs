// Formula parser - converts formula source (without the leading '=') into an AST
// Supports: numbers, cell refs (A1), basic math (+, -, *, /), unary sign, parens

use crate::position::Position;
use crate::value::format_number;

/// Arithmetic expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Cell reference; always in-bounds (the tokenizer rejects out-of-range
    /// references as syntax errors).
    Ref(Position),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Parse formula source into an AST. The input is the text after the `=`
/// marker.
pub fn parse(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err("empty formula".to_string());
    }
    let (expr, pos) = parse_add_sub(&tokens, 0)?;
    if pos != tokens.len() {
        return Err(format!("unexpected trailing input at token {}", pos));
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    CellRef(Position),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            'A'..='Z' | 'a'..='z' => {
                // Cell reference: letters then digits (A1, AA10, ...)
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let pos: Position = ident
                    .parse()
                    .map_err(|_| format!("invalid cell reference: {}", ident))?;
                tokens.push(Token::CellRef(pos));
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_unary(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_unary(tokens, pos + 1)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_unary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("unexpected end of expression".to_string());
    }

    let op = match &tokens[pos] {
        Token::Plus => UnaryOp::Plus,
        Token::Minus => UnaryOp::Minus,
        _ => return parse_primary(tokens, pos),
    };
    let (operand, new_pos) = parse_unary(tokens, pos + 1)?;
    Ok((
        Expr::Unary {
            op,
            operand: Box::new(operand),
        },
        new_pos,
    ))
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("unexpected end of expression".to_string());
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::CellRef(p) => Ok((Expr::Ref(*p), pos + 1)),
        Token::LParen => {
            let (expr, pos) = parse_add_sub(tokens, pos + 1)?;
            if pos >= tokens.len() {
                return Err("missing closing parenthesis".to_string());
            }
            match &tokens[pos] {
                Token::RParen => Ok((expr, pos + 1)),
                _ => Err("expected closing parenthesis".to_string()),
            }
        }
        _ => Err(format!("unexpected token at position {}", pos)),
    }
}

// =============================================================================
// Canonical re-printing
// =============================================================================

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

impl Expr {
    /// Normalized formula source without the leading `=`, with minimal
    /// parentheses. Re-parsing the output yields an equal tree.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        self.print(&mut out);
        out
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Ref(_) => PREC_ATOM,
            Expr::Unary { .. } => PREC_UNARY,
            Expr::Binary { op: Op::Mul | Op::Div, .. } => PREC_MUL,
            Expr::Binary { op: Op::Add | Op::Sub, .. } => PREC_ADD,
        }
    }

    fn print(&self, out: &mut String) {
        match self {
            Expr::Number(n) => out.push_str(&format_number(*n)),
            Expr::Ref(p) => out.push_str(&p.to_string()),
            Expr::Unary { op, operand } => {
                out.push(match op {
                    UnaryOp::Plus => '+',
                    UnaryOp::Minus => '-',
                });
                print_child(operand, operand.precedence() < PREC_UNARY, out);
            }
            Expr::Binary { op, left, right } => {
                let prec = self.precedence();
                print_child(left, left.precedence() < prec, out);
                out.push(match op {
                    Op::Add => '+',
                    Op::Sub => '-',
                    Op::Mul => '*',
                    Op::Div => '/',
                });
                // Equal-precedence right operands need parens after - and /
                // (a-(b+c) is not a-b+c), and a bare sign would fuse with the
                // operator (a--b).
                let needs_parens = right.precedence() < prec
                    || (right.precedence() == prec && matches!(op, Op::Sub | Op::Div))
                    || matches!(right.as_ref(), Expr::Unary { .. });
                print_child(right, needs_parens, out);
            }
        }
    }
}

fn print_child(child: &Expr, parens: bool, out: &mut String) {
    if parens {
        out.push('(');
    }
    child.print(out);
    if parens {
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(source: &str) -> String {
        parse(source).unwrap().canonical_text()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse("1.5").unwrap(), Expr::Number(1.5));
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse("B2").unwrap(), Expr::Ref(Position::new(1, 1)));
        assert_eq!(parse("aa10").unwrap(), Expr::Ref(Position::new(9, 26)));
    }

    #[test]
    fn test_precedence() {
        // 1+2*3 groups as 1+(2*3)
        let expr = parse("1+2*3").unwrap();
        match expr {
            Expr::Binary { op: Op::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: Op::Mul, .. }));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse("").is_err());
        assert!(parse("1+").is_err());
        assert!(parse("(1+2").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("A1B2C").is_err());
        assert!(parse("#ref").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_ref() {
        // Row past the addressable bound is a syntax error, not a #REF! value.
        assert!(parse("A16385").is_err());
        assert!(parse("A16384+1").is_ok());
    }

    #[test]
    fn test_canonical_minimal_parens() {
        assert_eq!(roundtrip("1+2*3"), "1+2*3");
        assert_eq!(roundtrip("(1+2)*3"), "(1+2)*3");
        assert_eq!(roundtrip("((1+2))*3"), "(1+2)*3");
        assert_eq!(roundtrip("1-(2+3)"), "1-(2+3)");
        assert_eq!(roundtrip("1-(2-3)"), "1-(2-3)");
        assert_eq!(roundtrip("1-2-3"), "1-2-3");
        assert_eq!(roundtrip("6/(2*3)"), "6/(2*3)");
        assert_eq!(roundtrip("(1-2)+3"), "1-2+3");
    }

    #[test]
    fn test_canonical_unary() {
        assert_eq!(roundtrip("-A1"), "-A1");
        assert_eq!(roundtrip("-(A1+1)"), "-(A1+1)");
        assert_eq!(roundtrip("-A1*2"), "-A1*2");
        assert_eq!(roundtrip("2*-A1"), "2*(-A1)");
        assert_eq!(roundtrip("+B2"), "+B2");
    }

    #[test]
    fn test_canonical_whitespace_and_case() {
        assert_eq!(roundtrip(" b2 + 1 "), "B2+1");
        assert_eq!(roundtrip("2.0+1"), "2+1");
    }

    #[test]
    fn test_canonical_reparses_to_same_tree() {
        for source in ["1+2*3", "-(A1+1)/B2", "2*-A1", "(1-2)-(3-4)"] {
            let expr = parse(source).unwrap();
            let canonical = expr.canonical_text();
            assert_eq!(parse(&canonical).unwrap(), expr, "source: {}", source);
        }
    }
}
