//! 因子编码
//!
//! 引擎结果文件每行一个分解结果，格式为 `/` 分隔的项：
//! `p` 表示出现一次，`p^e` 表示出现 e 次。展开后第一个值是原合数，
//! 其余是它的素因子（保持引擎给出的顺序，不排序）。
//!
//! 上报格式则是 `composite=[f1, f2, ...]`，多行以 `\n` 连接。

use crate::error::CodecError;
use crate::models::composite::{is_decimal_literal, Composite};
use num_bigint::BigUint;
use std::fmt;

/// 单项允许的最大指数，防止截断的输出行造成巨量分配
const MAX_EXPONENT: usize = 1 << 16;

/// 一个合数及其素因子（可重复）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorizationResult {
    pub composite: Composite,
    pub factors: Vec<Composite>,
}

impl FactorizationResult {
    pub fn new(composite: Composite, factors: Vec<Composite>) -> Self {
        Self { composite, factors }
    }

    /// 引擎是否给出了至少一个因子
    pub fn is_complete(&self) -> bool {
        !self.factors.is_empty()
    }

    /// 上报格式的一行：`91=[7, 13]`
    pub fn report_line(&self) -> String {
        let factors = self
            .factors
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}=[{}]", self.composite, factors)
    }
}

/// 以引擎自己的紧凑记法输出，连续相同的因子合并为 `p^e`
impl fmt::Display for FactorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.composite)?;
        let mut i = 0;
        while i < self.factors.len() {
            let run = self.factors[i..]
                .iter()
                .take_while(|x| **x == self.factors[i])
                .count();
            if run == 1 {
                write!(f, "/{}", self.factors[i])?;
            } else {
                write!(f, "/{}^{}", self.factors[i], run)?;
            }
            i += run;
        }
        Ok(())
    }
}

/// 解析引擎结果文件中的一行
pub fn decode(line: &str) -> Result<FactorizationResult, CodecError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CodecError::malformed(line, "空行"));
    }

    let mut values = Vec::new();
    for term in trimmed.split('/') {
        let (base, exponent) = parse_term(line, term.trim())?;
        values.extend(std::iter::repeat(base).take(exponent));
    }

    let mut values = values.into_iter();
    let composite = values
        .next()
        .ok_or_else(|| CodecError::malformed(line, "没有任何数值"))?;

    Ok(FactorizationResult {
        composite,
        factors: values.collect(),
    })
}

fn parse_term(line: &str, term: &str) -> Result<(Composite, usize), CodecError> {
    let mut parts = term.split('^');
    let base_text = parts.next().unwrap_or_default();
    let exponent_text = parts.next();
    if parts.next().is_some() {
        return Err(CodecError::malformed(line, format!("项 '{}' 含有多个 '^'", term)));
    }

    let base = parse_value(line, base_text)?;

    let exponent = match exponent_text {
        None => 1,
        Some(text) => {
            if !is_decimal_literal(text) {
                return Err(CodecError::malformed(line, format!("指数 '{}' 不是整数", text)));
            }
            let exponent: usize = text
                .parse()
                .map_err(|_| CodecError::malformed(line, format!("指数 '{}' 过大", text)))?;
            if exponent == 0 || exponent > MAX_EXPONENT {
                return Err(CodecError::malformed(
                    line,
                    format!("指数 {} 超出范围 [1, {}]", exponent, MAX_EXPONENT),
                ));
            }
            exponent
        }
    };

    Ok((base, exponent))
}

fn parse_value(line: &str, text: &str) -> Result<Composite, CodecError> {
    if !is_decimal_literal(text) {
        return Err(CodecError::malformed(line, format!("'{}' 不是整数", text)));
    }
    let value = BigUint::parse_bytes(text.as_bytes(), 10)
        .ok_or_else(|| CodecError::malformed(line, format!("'{}' 不是整数", text)))?;
    if value < BigUint::from(2u8) {
        return Err(CodecError::malformed(line, format!("数值 {} 小于 2", value)));
    }
    Composite::new(value).ok_or_else(|| CodecError::malformed(line, "数值为 0"))
}

/// 把一组结果编码为上报载荷
pub fn encode(results: &[FactorizationResult]) -> String {
    results
        .iter()
        .map(FactorizationResult::report_line)
        .collect::<Vec<_>>()
        .join("\n")
}
