//! 合数类型

use num_bigint::BigUint;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("静态正则表达式"))
}

/// 判断文本是否是纯十进制数字串
pub fn is_decimal_literal(text: &str) -> bool {
    decimal_pattern().is_match(text)
}

/// 待分解的正整数
///
/// 任意精度，创建后不可变。按数值比较和哈希，
/// 所以 `"0091"` 与 `"91"` 是同一个合数。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Composite(BigUint);

/// 非法合数文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidComposite(pub String);

impl fmt::Display for InvalidComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "不是合法的十进制正整数: '{}'", self.0)
    }
}

impl std::error::Error for InvalidComposite {}

impl Composite {
    pub fn new(value: BigUint) -> Option<Self> {
        if value == BigUint::from(0u8) {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// 十进制位数
    pub fn digits(&self) -> usize {
        self.0.to_str_radix(10).len()
    }
}

impl FromStr for Composite {
    type Err = InvalidComposite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_decimal_literal(trimmed) {
            return Err(InvalidComposite(s.to_string()));
        }
        let value = BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .ok_or_else(|| InvalidComposite(s.to_string()))?;
        Composite::new(value).ok_or_else(|| InvalidComposite(s.to_string()))
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_large_composite() {
        let text = "1522605027922533360535618378132637429718068114961380688657908494580122963258952897654000350692006139";
        let composite: Composite = text.parse().unwrap();
        assert_eq!(composite.to_string(), text);
        assert_eq!(composite.digits(), 100);
    }

    #[test]
    fn test_reject_non_decimal() {
        assert!("".parse::<Composite>().is_err());
        assert!("12a".parse::<Composite>().is_err());
        assert!("-15".parse::<Composite>().is_err());
        assert!("+15".parse::<Composite>().is_err());
        assert!("1_000".parse::<Composite>().is_err());
        assert!("0".parse::<Composite>().is_err());
    }

    #[test]
    fn test_equal_by_value() {
        let a: Composite = "0091".parse().unwrap();
        let b: Composite = "91".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digits(), 2);
    }
}
