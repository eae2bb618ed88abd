use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::types::{is_identifier, FilterOp, FilterWhereInfo};

/// Compiles filter documents into SQL predicates and evaluates them against JSON rows.
///
/// A document is an object whose keys are either column names or logical
/// operators (`$and`, `$or`, `$not`). A column maps to a bare value (equality)
/// or to an object of `$op: value` pairs that are all required to hold.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_offset: usize,
}

impl FilterWhere {
    fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_offset: starting_param_index,
        }
    }

    /// Generate a WHERE predicate (without the keyword) and its bound parameters.
    /// Placeholders start after `starting_param_index`.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.build_logical(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    sql_conditions.push(self.build_sql_condition(&condition)?);
                }
            }
        }

        if sql_conditions.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(sql_conditions.join(" AND "))
        }
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        let mut conditions = vec![];
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = FilterOp::from_key(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            // Implicit equality: { field: value }
            _ => conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }),
        }
        Ok(conditions)
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;
        match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else { Ok(format!("{} = {}", quoted_column, self.param(data.clone()))) }
            }
            FilterOp::Ne => {
                if data.is_null() { Ok(format!("{} IS NOT NULL", quoted_column)) }
                else { Ok(format!("{} <> {}", quoted_column, self.param(data.clone()))) }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted_column, self.param(Self::require_string(condition)?))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted_column, self.param(Self::require_string(condition)?))),
            FilterOp::IEq => Ok(format!("LOWER({}) = LOWER({})", quoted_column, self.param(Self::require_string(condition)?))),
            FilterOp::In => {
                if let Value::Array(values) = data {
                    if values.is_empty() { return Ok("1=0".to_string()); }
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::Between => {
                let (low, high) = Self::require_pair(data)?;
                Ok(format!("{} BETWEEN {} AND {}", quoted_column, self.param(low), self.param(high)))
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_offset + self.param_values.len())
    }

    fn require_string(condition: &FilterWhereInfo) -> Result<Value, FilterError> {
        match &condition.data {
            Value::String(_) => Ok(condition.data.clone()),
            other => Err(FilterError::InvalidOperatorData(format!(
                "{:?} on '{}' requires a string, got {}",
                condition.operator, condition.column, other
            ))),
        }
    }

    fn require_pair(data: &Value) -> Result<(Value, Value), FilterError> {
        match data {
            Value::Array(values) if values.len() == 2 => Ok((values[0].clone(), values[1].clone())),
            _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
        }
    }

    /// Evaluate a filter document against a row serialized as a JSON object.
    ///
    /// Mirrors the SQL produced by [`FilterWhere::generate`]: comparisons with
    /// NULL are false, `$like`/`$ilike` follow SQL pattern rules.
    pub fn matches(where_data: &Value, row: &Value) -> Result<bool, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(true),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        for (key, value) in obj {
            let ok = if key.starts_with('$') {
                Self::matches_logical(key, value, row)?
            } else {
                let field = row.get(key).unwrap_or(&Value::Null);
                let mut all = true;
                for condition in Self::parse_field_condition(key, value)? {
                    if !Self::matches_condition(&condition, field)? {
                        all = false;
                        break;
                    }
                }
                all
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_logical(op: &str, value: &Value, row: &Value) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for v in arr {
                    results.push(Self::matches(v, row)?);
                }
                if op == "$and" {
                    Ok(results.into_iter().all(|r| r))
                } else {
                    Ok(results.into_iter().any(|r| r))
                }
            }
            "$not" => Ok(!Self::matches(value, row)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn matches_condition(condition: &FilterWhereInfo, field: &Value) -> Result<bool, FilterError> {
        let data = &condition.data;
        Ok(match condition.operator {
            FilterOp::Eq => {
                if data.is_null() { field.is_null() } else { compare(field, data) == Some(Ordering::Equal) }
            }
            FilterOp::Ne => {
                if data.is_null() { !field.is_null() } else { matches!(compare(field, data), Some(o) if o != Ordering::Equal) }
            }
            FilterOp::Gt => compare(field, data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(compare(field, data), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => compare(field, data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(compare(field, data), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Like | FilterOp::ILike | FilterOp::IEq => {
                let pattern = Self::require_string(condition)?;
                let pattern = pattern.as_str().unwrap_or_default();
                match field.as_str() {
                    None => false,
                    Some(text) => match condition.operator {
                        FilterOp::Like => like_match(pattern, text, false),
                        FilterOp::ILike => like_match(pattern, text, true),
                        _ => text.to_lowercase() == pattern.to_lowercase(),
                    },
                }
            }
            FilterOp::In => match data {
                Value::Array(values) => values.iter().any(|v| compare(field, v) == Some(Ordering::Equal)),
                other => compare(field, other) == Some(Ordering::Equal),
            },
            FilterOp::Between => {
                let (low, high) = Self::require_pair(data)?;
                matches!(compare(field, &low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(field, &high), Some(Ordering::Less | Ordering::Equal))
            }
        })
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Debug, PartialEq)]
enum LikeToken {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn like_tokens(pattern: &str, case_insensitive: bool) -> Vec<LikeToken> {
    let mut tokens = vec![];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            '%' => LikeToken::AnyMany,
            '_' => LikeToken::AnyOne,
            other => LikeToken::Literal(other),
        };
        tokens.push(match token {
            LikeToken::Literal(ch) if case_insensitive => LikeToken::Literal(ch.to_lowercase().next().unwrap_or(ch)),
            t => t,
        });
    }
    tokens
}

/// SQL `LIKE` matching with `%`, `_` and backslash escapes.
pub fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let tokens = like_tokens(pattern, case_insensitive);
    let text: Vec<char> = if case_insensitive {
        text.chars().map(|c| c.to_lowercase().next().unwrap_or(c)).collect()
    } else {
        text.chars().collect()
    };

    // reachable[j]: the first i tokens can consume the first j characters
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnyMany => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            LikeToken::AnyOne => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j];
                }
            }
            LikeToken::Literal(ch) => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j] && text[j] == *ch;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

/// Escape `%`, `_` and `\` so user input is matched literally inside a LIKE pattern.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
