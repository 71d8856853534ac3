//! Filter expression parsing.

use crate::error::{GatewayError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 11] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::In,
        FilterOperator::NotIn,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::EndsWith => "endswith",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notin",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        FilterOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                GatewayError::invalid_field(
                    "filter",
                    format!("unknown filter operator '{s}'"),
                    "operator",
                )
            })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group combines its members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl FromStr for LogicalOperator {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("and") {
            Ok(LogicalOperator::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(LogicalOperator::Or)
        } else {
            Err(GatewayError::invalid_field(
                "filter",
                format!("unknown logical operator '{s}'"),
                "logical_operator",
            ))
        }
    }
}

/// `field op value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    /// Raw textual value; coerced to the field's type at evaluation time
    pub value: String,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A tree of conditions. An empty group matches every record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterGroup {
    pub conditions: Vec<FilterCondition>,
    pub groups: Vec<FilterGroup>,
    pub logic: LogicalOperator,
}

/// Parse result of one filter expression
pub type FilterOptions = FilterGroup;

impl FilterGroup {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Number of leaf conditions in the whole tree
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(FilterGroup::condition_count)
                .sum::<usize>()
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    if let Some(&next) = chars.peek() {
                        if next == quote || next == '\\' {
                            text.push(next);
                            chars.next();
                            continue;
                        }
                    }
                }
                if ch == quote {
                    closed = true;
                    break;
                }
                text.push(ch);
            }
            if !closed {
                return Err(GatewayError::invalid_field(
                    "filter",
                    format!("unterminated quoted value in '{expr}'"),
                    "syntax",
                ));
            }
            tokens.push(Token { text, quoted: true });
            continue;
        }
        let mut text = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            text.push(ch);
            chars.next();
        }
        tokens.push(Token {
            text,
            quoted: false,
        });
    }
    Ok(tokens)
}

/// Parse a filter expression into a [`FilterGroup`]
///
/// A blank expression yields an empty group, which matches everything.
///
/// # Errors
///
/// Returns a validation error on malformed syntax (missing operator or value,
/// unterminated quote, dangling logical operator), an unknown comparison operator
/// or an unknown logical operator.
pub fn parse_filter(expr: &str) -> Result<FilterGroup> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Ok(FilterGroup::default());
    }

    // Runs of AND-joined conditions, separated by OR
    let mut runs: Vec<Vec<FilterCondition>> = vec![Vec::new()];
    let mut iter = tokens.into_iter();

    loop {
        let field = iter.next().ok_or_else(|| syntax(expr, "expected a field name"))?;
        if field.quoted || field.text.is_empty() {
            return Err(syntax(expr, "field names must be bare words"));
        }
        let op = iter
            .next()
            .ok_or_else(|| syntax(expr, &format!("expected an operator after '{}'", field.text)))?;
        if op.quoted {
            return Err(syntax(expr, &format!("expected an operator after '{}'", field.text)));
        }
        let operator: FilterOperator = op.text.parse()?;
        let value = iter.next().ok_or_else(|| {
            syntax(
                expr,
                &format!("expected a value after '{} {}'", field.text, operator),
            )
        })?;

        if let Some(run) = runs.last_mut() {
            run.push(FilterCondition::new(field.text, operator, value.text));
        }

        match iter.next() {
            None => break,
            Some(logical) => {
                if logical.quoted {
                    return Err(syntax(expr, "expected 'and' or 'or'"));
                }
                match logical.text.parse::<LogicalOperator>()? {
                    LogicalOperator::And => {}
                    LogicalOperator::Or => runs.push(Vec::new()),
                }
            }
        }
    }

    Ok(build_group(runs))
}

fn build_group(mut runs: Vec<Vec<FilterCondition>>) -> FilterGroup {
    if runs.len() == 1 {
        return FilterGroup {
            conditions: runs.pop().unwrap_or_default(),
            groups: Vec::new(),
            logic: LogicalOperator::And,
        };
    }

    let mut root = FilterGroup {
        logic: LogicalOperator::Or,
        ..FilterGroup::default()
    };
    for mut run in runs {
        if run.len() == 1 {
            root.conditions.extend(run.pop());
        } else {
            root.groups.push(FilterGroup {
                conditions: run,
                groups: Vec::new(),
                logic: LogicalOperator::And,
            });
        }
    }
    root
}

fn syntax(expr: &str, detail: &str) -> GatewayError {
    GatewayError::invalid_field(
        "filter",
        format!("invalid filter expression '{expr}': {detail}"),
        "syntax",
    )
}
