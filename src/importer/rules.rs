// ==========================================
// 表格导入引擎 - 校验规则
// ==========================================
// 规则表达式: "required|email" 或 ["required", "regex:^a|b$"]
// 参数格式:   "<name>:<p1>,<p2>"（regex 参数不拆分）
// 注意: 管道写法下 regex 中不能出现 '|'，需改用列表写法
// ==========================================

use crate::domain::cell::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid regex")
});

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

// ==========================================
// RuleSpec - 配置中的规则写法
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Pipe(String),
    List(Vec<String>),
}

impl From<&str> for RuleSpec {
    fn from(expr: &str) -> Self {
        RuleSpec::Pipe(expr.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(expr: String) -> Self {
        RuleSpec::Pipe(expr)
    }
}

impl From<Vec<&str>> for RuleSpec {
    fn from(exprs: Vec<&str>) -> Self {
        RuleSpec::List(exprs.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for RuleSpec {
    fn from(exprs: Vec<String>) -> Self {
        RuleSpec::List(exprs)
    }
}

// ==========================================
// Rule - 单条规则
// ==========================================
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Nullable,
    String,
    Numeric,
    Integer,
    Boolean,
    Email,
    Min(f64),
    Max(f64),
    Between(f64, f64),
    In(Vec<String>),
    NotIn(Vec<String>),
    Date,
    Regex(Regex),
    Distinct,
}

impl Rule {
    /// 解析单条规则表达式
    ///
    /// # 参数
    /// - field: 所属字段（仅用于错误定位）
    /// - expr: 如 "between:1,10"
    pub fn parse(field: &str, expr: &str) -> ImportResult<Rule> {
        let expr = expr.trim();
        let (name, param) = match expr.split_once(':') {
            Some((name, param)) => (name.trim(), Some(param)),
            None => (expr, None),
        };

        let rule = match (name, param) {
            ("required", None) => Rule::Required,
            ("nullable", None) => Rule::Nullable,
            ("string", None) => Rule::String,
            ("numeric", None) => Rule::Numeric,
            ("integer", None) => Rule::Integer,
            ("boolean", None) => Rule::Boolean,
            ("email", None) => Rule::Email,
            ("date", None) => Rule::Date,
            ("distinct", None) => Rule::Distinct,
            ("min", Some(p)) => Rule::Min(parse_number(field, expr, p)?),
            ("max", Some(p)) => Rule::Max(parse_number(field, expr, p)?),
            ("between", Some(p)) => {
                let bounds = split_params(p);
                if bounds.len() != 2 {
                    return Err(invalid(field, expr, "需要两个参数"));
                }
                let min = parse_number(field, expr, &bounds[0])?;
                let max = parse_number(field, expr, &bounds[1])?;
                if min > max {
                    return Err(invalid(field, expr, "下限大于上限"));
                }
                Rule::Between(min, max)
            }
            ("in", Some(p)) => Rule::In(split_params(p)),
            ("not_in", Some(p)) => Rule::NotIn(split_params(p)),
            ("regex", Some(p)) => {
                let re = Regex::new(p).map_err(|e| invalid(field, expr, &e.to_string()))?;
                Rule::Regex(re)
            }
            (
                "required" | "nullable" | "string" | "numeric" | "integer" | "boolean" | "email"
                | "date" | "distinct",
                Some(_),
            ) => return Err(invalid(field, expr, "该规则不接受参数")),
            ("min" | "max" | "between" | "in" | "not_in" | "regex", None) => {
                return Err(invalid(field, expr, "缺少参数"))
            }
            _ => return Err(invalid(field, expr, "未知规则")),
        };
        Ok(rule)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Nullable => "nullable",
            Rule::String => "string",
            Rule::Numeric => "numeric",
            Rule::Integer => "integer",
            Rule::Boolean => "boolean",
            Rule::Email => "email",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Between(_, _) => "between",
            Rule::In(_) => "in",
            Rule::NotIn(_) => "not_in",
            Rule::Date => "date",
            Rule::Regex(_) => "regex",
            Rule::Distinct => "distinct",
        }
    }

    /// 空白值也需要检查的规则
    pub fn is_implicit(&self) -> bool {
        matches!(self, Rule::Required)
    }

    /// 是否需要整批数据（由校验引擎单独处理）
    pub fn is_batch_rule(&self) -> bool {
        matches!(self, Rule::Distinct)
    }

    /// 单值检查
    ///
    /// # 参数
    /// - value: 单元格值
    /// - numeric: 字段是否按数值比较大小（规则集中含 numeric / integer）
    pub fn passes(&self, value: &CellValue, numeric: bool) -> bool {
        match self {
            Rule::Required => !value.is_blank(),
            Rule::Nullable | Rule::Distinct => true,
            Rule::String => matches!(value, CellValue::Text(_)),
            Rule::Numeric => value.as_f64().is_some(),
            Rule::Integer => value.as_i64().is_some(),
            Rule::Boolean => value.as_bool().is_some(),
            Rule::Email => EMAIL_RE.is_match(&value.to_string()),
            Rule::Min(min) => size_of(value, numeric).is_some_and(|s| s >= *min),
            Rule::Max(max) => size_of(value, numeric).is_some_and(|s| s <= *max),
            Rule::Between(min, max) => {
                size_of(value, numeric).is_some_and(|s| s >= *min && s <= *max)
            }
            Rule::In(values) => values.contains(&value.to_string()),
            Rule::NotIn(values) => !values.contains(&value.to_string()),
            Rule::Date => is_date(&value.to_string()),
            Rule::Regex(re) => re.is_match(&value.to_string()),
        }
    }

    /// 消息键；大小类规则区分数值与字符串
    pub fn message_key(&self, numeric: bool) -> String {
        match self {
            Rule::Min(_) | Rule::Max(_) | Rule::Between(_, _) => {
                let kind = if numeric { "numeric" } else { "string" };
                format!("validation.{}.{}", self.name(), kind)
            }
            _ => format!("validation.{}", self.name()),
        }
    }

    /// 消息占位符 (名称, 值)
    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        match self {
            Rule::Min(min) => vec![("min", format_number(*min))],
            Rule::Max(max) => vec![("max", format_number(*max))],
            Rule::Between(min, max) => {
                vec![("min", format_number(*min)), ("max", format_number(*max))]
            }
            Rule::In(values) | Rule::NotIn(values) => vec![("values", values.join(", "))],
            _ => Vec::new(),
        }
    }
}

/// 大小: 数值字段取数值，否则取字符数
fn size_of(value: &CellValue, numeric: bool) -> Option<f64> {
    if numeric {
        return value.as_f64();
    }
    Some(value.to_string().chars().count() as f64)
}

fn is_date(text: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn split_params(param: &str) -> Vec<String> {
    param.split(',').map(|p| p.trim().to_string()).collect()
}

fn parse_number(field: &str, expr: &str, param: &str) -> ImportResult<f64> {
    param
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid(field, expr, "参数不是数字"))
}

fn invalid(field: &str, expr: &str, reason: &str) -> ImportError {
    ImportError::configuration(field, format!("校验规则 \"{}\" 无效: {}", expr, reason))
}

// ==========================================
// RuleSet - 单字段的规则集
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// 按配置写法解析；空表达式忽略
    pub fn parse(field: &str, spec: &RuleSpec) -> ImportResult<RuleSet> {
        let exprs: Vec<&str> = match spec {
            RuleSpec::Pipe(pipe) => pipe.split('|').collect(),
            RuleSpec::List(list) => list.iter().map(String::as_str).collect(),
        };

        let rules = exprs
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| Rule::parse(field, e))
            .collect::<ImportResult<Vec<Rule>>>()?;

        Ok(RuleSet { rules })
    }

    /// 含 numeric / integer 时按数值比较大小
    pub fn is_numeric(&self) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, Rule::Numeric | Rule::Integer))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
