// SPDX-License-Identifier: Apache-2.0

//! Chumsky grammar over the token stream.
//!
//! Produces the unresolved AST in `ast`; converter, enum, and path binding
//! happens afterwards in `bind`.

use chumsky::prelude::*;

use crate::ast::*;
use crate::lexer::Token;
use crate::value::Value;

/// Parser input: a slice of tokens.
pub(crate) type TokenInput<'src> = &'src [Token<'src>];

/// Parser error configuration.
pub(crate) type Extra<'src> = extra::Err<Rich<'src, Token<'src>>>;

/// Unescape a quoted string literal (removes quotes, handles \" and \\).
#[inline]
fn unescape(s: &str) -> String {
    s[1..s.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Decode a 0x... bytes literal; an odd trailing nibble is its own byte.
fn decode_bytes(s: &str) -> Vec<u8> {
    let hex = &s[2..];
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            let end = (i + 2).min(hex.len());
            u8::from_str_radix(&hex[i..end], 16).unwrap_or(0)
        })
        .collect()
}

fn literal_parser<'a>() -> impl Parser<'a, TokenInput<'a>, ValueExpr, Extra<'a>> + Clone {
    let string_literal = select_ref! {
        Token::StringLiteral(s) => Value::string(unescape(s))
    };

    let int_literal = select_ref! {
        Token::IntLiteral(s) => Value::Int(s.parse::<i64>().unwrap_or(0))
    };

    let float_literal = select_ref! {
        Token::FloatLiteral(s) => Value::Float(s.parse::<f64>().unwrap_or(0.0))
    };

    let bytes_literal = select_ref! {
        Token::BytesLiteral(s) => Value::bytes(decode_bytes(s))
    };

    let bool_literal = select_ref! {
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
    };

    let nil_literal = just(&Token::Nil).to(Value::Nil);

    choice((
        float_literal,
        int_literal,
        string_literal,
        bytes_literal,
        bool_literal,
        nil_literal,
    ))
    .map(ValueExpr::Literal)
}

/// Index expressions: "[" (string | int) "]"
fn index_parser<'a>() -> impl Parser<'a, TokenInput<'a>, IndexExpr, Extra<'a>> + Clone {
    choice((
        select_ref! { Token::StringLiteral(s) => IndexExpr::String(unescape(s)) },
        select_ref! { Token::IntLiteral(s) => IndexExpr::Int(s.parse::<usize>().unwrap_or(0)) },
    ))
    .delimited_by(just(&Token::LBracket), just(&Token::RBracket))
}

fn ident_parser<'a>(upper: bool) -> impl Parser<'a, TokenInput<'a>, String, Extra<'a>> + Clone {
    if upper {
        select_ref! { Token::UpperIdent(s) => s.to_string() }.boxed()
    } else {
        select_ref! { Token::LowerIdent(s) => s.to_string() }.boxed()
    }
}

/// Path expressions: lower_ident ("." ident)* index*
fn path_parser<'a>() -> impl Parser<'a, TokenInput<'a>, PathExpr, Extra<'a>> + Clone {
    let lower_ident = ident_parser(false);
    let ident_segment = ident_parser(false).or(ident_parser(true));
    let index = index_parser();

    lower_ident
        .then(
            just(&Token::Dot)
                .ignore_then(ident_segment)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(index.repeated().collect::<Vec<_>>())
        .map(|((first, rest), indexes)| {
            let mut segments = vec![first];
            segments.extend(rest);
            PathExpr { segments, indexes }
        })
}

fn comp_op_parser<'a>() -> impl Parser<'a, TokenInput<'a>, CompOp, Extra<'a>> + Clone {
    choice((
        just(&Token::Eq).to(CompOp::Eq),
        just(&Token::NotEq).to(CompOp::NotEq),
        just(&Token::LessEq).to(CompOp::LessEq),
        just(&Token::GreaterEq).to(CompOp::GreaterEq),
        just(&Token::Less).to(CompOp::Less),
        just(&Token::Greater).to(CompOp::Greater),
    ))
}

/// Unwraps trivial math wrappers so plain values stay plain in the AST.
fn math_to_value_expr(math: MathExpr) -> ValueExpr {
    match math {
        MathExpr::Primary(v) => v,
        other => ValueExpr::Math(Box::new(other)),
    }
}

/// Math expression parser with the usual precedence over a value parser.
fn make_math_expr<'a>(
    value_expr: impl Parser<'a, TokenInput<'a>, ValueExpr, Extra<'a>> + Clone + 'a,
) -> impl Parser<'a, TokenInput<'a>, MathExpr, Extra<'a>> + Clone + 'a {
    recursive(move |math_expr| {
        let paren_math = math_expr
            .clone()
            .delimited_by(just(&Token::LParen), just(&Token::RParen));

        let primary = choice((paren_math, value_expr.clone().map(MathExpr::Primary)));

        let unary_op = choice((just(&Token::Plus).to(false), just(&Token::Minus).to(true)));

        let factor = unary_op.or_not().then(primary).map(|(neg, expr)| match neg {
            Some(true) => MathExpr::Negate(Box::new(expr)),
            _ => expr,
        });

        let mul_op = choice((
            just(&Token::Star).to(MathOp::Mul),
            just(&Token::Slash).to(MathOp::Div),
        ));

        let term = factor
            .clone()
            .foldl(mul_op.then(factor).repeated(), |left, (op, right)| {
                MathExpr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            });

        let add_op = choice((
            just(&Token::Plus).to(MathOp::Add),
            just(&Token::Minus).to(MathOp::Sub),
        ));

        term.clone()
            .foldl(add_op.then(term).repeated(), |left, (op, right)| {
                MathExpr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            })
    })
}

/// Full value expression parser (everything except the math wrapper).
fn value_expr_parser<'a>() -> impl Parser<'a, TokenInput<'a>, ValueExpr, Extra<'a>> + Clone {
    let literal = literal_parser();
    let index = index_parser();
    let path = path_parser();

    recursive(move |value_expr| {
        let element = make_math_expr(value_expr.clone()).map(math_to_value_expr);

        let list = element
            .clone()
            .separated_by(just(&Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(&Token::LBracket), just(&Token::RBracket))
            .map(ValueExpr::List);

        let map_entry = select_ref! { Token::StringLiteral(s) => unescape(s) }
            .then_ignore(just(&Token::Colon))
            .then(element.clone());

        let map = map_entry
            .separated_by(just(&Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(&Token::LBrace), just(&Token::RBrace))
            .map(ValueExpr::Map);

        let arg_list = element
            .separated_by(just(&Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(&Token::LParen), just(&Token::RParen));

        let converter_call = ident_parser(true)
            .then(arg_list)
            .then(index.clone().repeated().collect::<Vec<_>>())
            .map(|((name, args), indexes)| {
                ValueExpr::Call(FunctionCall {
                    name,
                    args,
                    indexes,
                })
            });

        let enum_name = ident_parser(true).map(ValueExpr::EnumName);

        choice((
            converter_call,
            list,
            map,
            enum_name,
            path.clone().map(ValueExpr::Path),
            literal.clone(),
        ))
    })
}

/// Entry point for value productions.
pub(crate) fn value_entry<'a>() -> impl Parser<'a, TokenInput<'a>, ValueExpr, Extra<'a>> {
    make_math_expr(value_expr_parser())
        .map(math_to_value_expr)
        .then_ignore(end())
}

/// Entry point for boolean conditions.
pub(crate) fn condition_entry<'a>() -> impl Parser<'a, TokenInput<'a>, BoolExpr, Extra<'a>> {
    let value_expr = value_expr_parser();
    let comparison_value = make_math_expr(value_expr.clone()).map(math_to_value_expr);
    let comp_op = comp_op_parser();
    let path = path_parser();

    let bool_expr = recursive(move |bool_expr| {
        let comparison = comparison_value
            .clone()
            .then(comp_op.clone())
            .then(comparison_value.clone())
            .map(|((left, op), right)| BoolExpr::Comparison { left, op, right });

        let bool_literal = select_ref! {
            Token::True => BoolExpr::Literal(true),
            Token::False => BoolExpr::Literal(false),
        };

        let bool_converter = value_expr.clone().try_map(|v, span| match v {
            ValueExpr::Call(fc) => Ok(BoolExpr::Converter(fc)),
            _ => Err(Rich::custom(span, "expected converter call")),
        });

        let bool_path = path.clone().map(BoolExpr::Path);

        let bool_primary = choice((
            bool_expr
                .clone()
                .delimited_by(just(&Token::LParen), just(&Token::RParen)),
            comparison,
            bool_literal,
            bool_converter,
            bool_path,
        ));

        let bool_factor = just(&Token::Not)
            .or_not()
            .then(bool_primary)
            .map(|(not, expr)| {
                if not.is_some() {
                    BoolExpr::Not(Box::new(expr))
                } else {
                    expr
                }
            });

        let bool_term = bool_factor.clone().foldl(
            just(&Token::And).ignore_then(bool_factor).repeated(),
            |left, right| BoolExpr::And(Box::new(left), Box::new(right)),
        );

        bool_term.clone().foldl(
            just(&Token::Or).ignore_then(bool_term).repeated(),
            |left, right| BoolExpr::Or(Box::new(left), Box::new(right)),
        )
    });

    bool_expr.then_ignore(end())
}
