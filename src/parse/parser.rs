use crate::RuleRecord;

/// The result of parsing a rule file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRules {
    /// Records in file order, including disabled ones.
    pub records: Vec<RuleRecord>,
}
