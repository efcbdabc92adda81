// SPDX-License-Identifier: Apache-2.0

//! Domain converters registered on top of the standard library:
//! `NormalizePath`, `ParseSQL`, `RemoveQueryParams`, `FirstNonNil`.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use ottl::{BoundFn, ConverterFactory, Expr, Value};

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("uuid regex")
});

static SQL_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*SELECT\s+.*?\s+FROM\s+(\S+)").expect("select regex"));
static SQL_INSERT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*INSERT\s+INTO\s+(\S+)").expect("insert regex"));
static SQL_UPDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*UPDATE\s+(\S+)").expect("update regex"));
static SQL_DELETE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*DELETE\s+FROM\s+(\S+)").expect("delete regex"));

/// Registers the four domain converters on a parser.
pub fn register_semconv_converters(parser: &mut ottl::Parser) {
    parser.register_converter(Arc::new(NormalizePathFactory));
    parser.register_converter(Arc::new(ParseSqlFactory));
    parser.register_converter(Arc::new(RemoveQueryParamsFactory));
    parser.register_converter(Arc::new(FirstNonNilFactory));
}

/// Replaces high-cardinality URL path fragments with `{id}`.
///
/// Order is fixed: drop the query string, rewrite UUIDs wherever they
/// appear, then rewrite whole path segments that are long hex runs
/// (Mongo ObjectId style) or purely numeric. Idempotent.
pub(crate) fn normalize_path(path: &str) -> String {
    let path = match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    };

    let path = UUID_RE.replace_all(path, "{id}");

    path.split('/')
        .map(|segment| if is_id_segment(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_id_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    segment.bytes().all(|b| b.is_ascii_digit())
        || (segment.len() >= 16 && segment.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Extracts `OPERATION TABLE` from common SQL statements, falling back to
/// the uppercased first word, or `UNKNOWN` for blank input.
pub(crate) fn parse_sql(statement: &str) -> String {
    let statement = statement.trim();

    for (regex, operation) in [
        (&SQL_SELECT_RE, "SELECT"),
        (&SQL_INSERT_RE, "INSERT"),
        (&SQL_UPDATE_RE, "UPDATE"),
        (&SQL_DELETE_RE, "DELETE"),
    ] {
        if let Some(captures) = regex.captures(statement) {
            return format!("{} {}", operation, clean_table_name(&captures[1]));
        }
    }

    match statement.split_whitespace().next() {
        Some(word) => word.to_uppercase(),
        None => "UNKNOWN".to_string(),
    }
}

/// Strips quoting from a table token and reduces `schema.table` to the
/// table part.
fn clean_table_name(table: &str) -> String {
    const QUOTES: &[char] = &['`', '"', '\'', '[', ']'];

    let table = table.trim_matches(QUOTES);
    match table.rsplit_once('.') {
        Some((_, last)) => last.trim_matches(QUOTES).to_string(),
        None => table.to_string(),
    }
}

/// The part of `s` preceding the first `?`, or `s` unchanged.
pub(crate) fn remove_query_params(s: &str) -> &str {
    match s.find('?') {
        Some(idx) => &s[..idx],
        None => s,
    }
}

fn single_arg(name: &str, mut args: Vec<Expr>) -> ottl::Result<Expr> {
    if args.len() != 1 {
        return Err(format!("{} expects 1 argument, got {}", name, args.len()).into());
    }
    Ok(args.pop().expect("arity checked"))
}

fn string_arg(name: &str, expr: &Expr, ctx: &dyn ottl::PathContext) -> ottl::Result<String> {
    match expr.eval(ctx)? {
        Value::String(s) => Ok(s),
        other => Err(format!("{} expects a string, got {:?}", name, other).into()),
    }
}

pub struct NormalizePathFactory;

impl ConverterFactory for NormalizePathFactory {
    fn name(&self) -> &'static str {
        "NormalizePath"
    }

    fn bind(&self, args: Vec<Expr>) -> ottl::Result<BoundFn> {
        let target = single_arg("NormalizePath", args)?;
        Ok(Arc::new(move |ctx| {
            let path = string_arg("NormalizePath", &target, ctx)?;
            Ok(Value::String(normalize_path(&path)))
        }))
    }
}

pub struct ParseSqlFactory;

impl ConverterFactory for ParseSqlFactory {
    fn name(&self) -> &'static str {
        "ParseSQL"
    }

    fn bind(&self, args: Vec<Expr>) -> ottl::Result<BoundFn> {
        let target = single_arg("ParseSQL", args)?;
        Ok(Arc::new(move |ctx| {
            let statement = string_arg("ParseSQL", &target, ctx)?;
            Ok(Value::String(parse_sql(&statement)))
        }))
    }
}

pub struct RemoveQueryParamsFactory;

impl ConverterFactory for RemoveQueryParamsFactory {
    fn name(&self) -> &'static str {
        "RemoveQueryParams"
    }

    fn bind(&self, args: Vec<Expr>) -> ottl::Result<BoundFn> {
        let target = single_arg("RemoveQueryParams", args)?;
        Ok(Arc::new(move |ctx| {
            let path = string_arg("RemoveQueryParams", &target, ctx)?;
            Ok(Value::String(remove_query_params(&path).to_string()))
        }))
    }
}

/// `FirstNonNil([a, b, ...])` — evaluates getters left to right and returns
/// the first value that evaluates without error and is not nil. Getters
/// that error are skipped; nil if all fail or are nil.
pub struct FirstNonNilFactory;

impl ConverterFactory for FirstNonNilFactory {
    fn name(&self) -> &'static str {
        "FirstNonNil"
    }

    fn bind(&self, args: Vec<Expr>) -> ottl::Result<BoundFn> {
        let getters = match single_arg("FirstNonNil", args)? {
            Expr::List(items) => items,
            _ => return Err("FirstNonNil expects a list of values".into()),
        };

        Ok(Arc::new(move |ctx| {
            for getter in &getters {
                match getter.eval(ctx) {
                    Err(_) => continue,
                    Ok(value) if value.is_nil() => continue,
                    Ok(value) => return Ok(value),
                }
            }
            Ok(Value::Nil)
        }))
    }
}
