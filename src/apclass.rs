//! Compatibility classes for attachment points.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::edge::BondType;

/// A compatibility class assigned to an attachment point.
///
/// A class is a rule name plus a sub-rule index, rendered as `"rule:sub"`,
/// and carries the bond type an edge between two points of this class should
/// use. Classes are totally ordered by rule name, then sub-rule, then bond
/// type, so collections of classes have a stable, deterministic order.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApClass {
    rule: String,
    sub_class: u32,
    bond_type: BondType,
}

impl ApClass {
    /// Builds a class from a rule name and sub-rule index, with the default
    /// single-bond type.
    pub fn new(rule: &str, sub_class: u32) -> Result<Self, ApClassError> {
        Self::with_bond_type(rule, sub_class, BondType::Single)
    }

    /// Builds a class with an explicit bond type.
    pub fn with_bond_type(
        rule: &str,
        sub_class: u32,
        bond_type: BondType,
    ) -> Result<Self, ApClassError> {
        if !Self::is_valid_rule(rule) {
            return Err(ApClassError::InvalidRule(rule.to_string()));
        }
        Ok(ApClass {
            rule: rule.to_string(),
            sub_class,
            bond_type,
        })
    }

    /// A rule name is one or more characters, none of which is whitespace or
    /// the `:` separator.
    pub fn is_valid_rule(rule: &str) -> bool {
        !rule.is_empty() && !rule.chars().any(|c| c == ':' || c.is_whitespace())
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn sub_class(&self) -> u32 {
        self.sub_class
    }

    pub fn bond_type(&self) -> BondType {
        self.bond_type
    }

    /// Whether this class marks a ring-closing attachment point.
    pub fn is_ring_closing(&self) -> bool {
        matches!(self.rule.as_str(), "ATplus" | "ATminus" | "ATneutral")
    }
}

impl PartialOrd for ApClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rule
            .cmp(&other.rule)
            .then(self.sub_class.cmp(&other.sub_class))
            .then(self.bond_type.cmp(&other.bond_type))
    }
}

impl fmt::Display for ApClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.rule, self.sub_class)
    }
}

impl fmt::Debug for ApClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ApClass({}:{})", self.rule, self.sub_class)
    }
}

impl FromStr for ApClass {
    type Err = ApClassError;

    /// Parses `"rule:sub"`. The sub-rule must be the last `:`-separated
    /// token and a base-10 integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rule, sub) = s
            .rsplit_once(':')
            .ok_or_else(|| ApClassError::MissingSubClass(s.to_string()))?;
        let sub_class: u32 = sub
            .parse()
            .map_err(|_| ApClassError::InvalidSubClass(s.to_string()))?;
        ApClass::new(rule, sub_class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApClassError {
    /// The rule name contains forbidden characters or is empty.
    InvalidRule(String),
    /// The string has no `:` separator.
    MissingSubClass(String),
    /// The token after the last `:` is not an integer.
    InvalidSubClass(String),
}

impl fmt::Display for ApClassError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApClassError::InvalidRule(r) => {
                write!(f, "invalid attachment point class rule: {r:?}")
            }
            ApClassError::MissingSubClass(s) => {
                write!(f, "attachment point class without sub-class: {s:?}")
            }
            ApClassError::InvalidSubClass(s) => {
                write!(f, "attachment point class with non-numeric sub-class: {s:?}")
            }
        }
    }
}

impl Error for ApClassError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round() {
        let c: ApClass = "amine:0".parse().unwrap();
        assert_eq!(c.rule(), "amine");
        assert_eq!(c.sub_class(), 0);
        assert_eq!(c.bond_type(), BondType::Single);
        assert_eq!(c.to_string(), "amine:0");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(matches!(
            "noseparator".parse::<ApClass>(),
            Err(ApClassError::MissingSubClass(_))
        ));
        assert!(matches!(
            "rule:notanumber".parse::<ApClass>(),
            Err(ApClassError::InvalidSubClass(_))
        ));
        assert!(matches!(
            "bad rule:1".parse::<ApClass>(),
            Err(ApClassError::InvalidRule(_))
        ));
        assert!(matches!(
            ":1".parse::<ApClass>(),
            Err(ApClassError::InvalidRule(_))
        ));
    }

    #[test]
    fn rule_with_inner_separator_uses_last_token_as_sub_class() {
        assert!("a:b:1".parse::<ApClass>().is_err());
        let c: ApClass = "a-b_c:3".parse().unwrap();
        assert_eq!(c.rule(), "a-b_c");
        assert_eq!(c.sub_class(), 3);
    }

    #[test]
    fn total_order_is_rule_then_sub_class() {
        let a = ApClass::new("amine", 1).unwrap();
        let b = ApClass::new("amine", 2).unwrap();
        let c = ApClass::new("ether", 0).unwrap();
        let mut v = vec![c.clone(), b.clone(), a.clone()];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }
}
