use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
};
use serde_json::Value;
use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::Statement;

/// Parser for the textual query language.
///
/// Statements are separated by `;`:
/// - `index.op(args...)` with string (single or double quoted), number,
///   boolean or null arguments
/// - `order_by(index, asc|desc)`
/// - `limit(n)`, `offset(n)`
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        QueryParser
    }

    pub fn parse(&self, input: &str) -> Result<Vec<Statement>> {
        let mut script = all_consuming(delimited(
            multispace0,
            terminated(separated_list0(ws(char(';')), statement), opt(ws(char(';')))),
            multispace0,
        ));

        script
            .parse(input)
            .map(|(_, statements)| statements)
            .map_err(|e| Error::new(ErrorKind::Parse, format!("Invalid query: {}", e)))
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        QueryParser::new()
    }
}

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn statement(input: &str) -> IResult<&str, Statement> {
    alt((order_by, limit, offset, constrain)).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

fn constrain(input: &str) -> IResult<&str, Statement> {
    map(
        (identifier, char('.'), identifier, call_args),
        |(index, _, op, args)| Statement::Constrain {
            index: index.to_string(),
            op: op.to_string(),
            args,
        },
    )
    .parse(input)
}

fn order_by(input: &str) -> IResult<&str, Statement> {
    map(
        preceded(
            tag("order_by"),
            delimited(
                ws(char('(')),
                (identifier, ws(char(',')), identifier),
                ws(char(')')),
            ),
        ),
        |(index, _, direction)| Statement::OrderBy {
            index: index.to_string(),
            direction: direction.to_string(),
        },
    )
    .parse(input)
}

fn limit(input: &str) -> IResult<&str, Statement> {
    map(preceded(tag("limit"), count_arg), Statement::Limit).parse(input)
}

fn offset(input: &str) -> IResult<&str, Statement> {
    map(preceded(tag("offset"), count_arg), Statement::Offset).parse(input)
}

fn count_arg(input: &str) -> IResult<&str, u32> {
    delimited(
        ws(char('(')),
        map_res(digit1, str::parse::<u32>),
        ws(char(')')),
    )
    .parse(input)
}

fn call_args(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), literal),
        ws(char(')')),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(double_quoted, Value::String),
        map(single_quoted, Value::String),
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
        value(Value::Null, tag("null")),
        number,
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map_res(recognize_float, |s: &str| {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Value::from(i));
        }
        if let Ok(u) = s.parse::<u64>() {
            return Ok(Value::from(u));
        }
        s.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or("not a finite number")
    })
    .parse(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '"')
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '\'')
}

// Backslash escapes: \n, \t, and any other character taken literally
fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let (mut rest, _) = char(quote).parse(input)?;
    let mut out = String::new();

    loop {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c == quote => return Ok((chars.as_str(), out)),
            Some('\\') => {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => break,
                }
                rest = chars.as_str();
            }
            Some(c) => {
                out.push(c);
                rest = chars.as_str();
            }
            None => break,
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        rest,
        nom::error::ErrorKind::Char,
    )))
}
