use std::fmt;

/// Quote style around the dependency name and version in a podspec
/// `s.dependency` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    pub const ALL: [Quote; 2] = [Quote::Single, Quote::Double];

    fn ch(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }
}

/// Version-pin operator inside the quoted version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOperator {
    /// Plain version: `'6.16'`.
    Bare,
    /// Exact pin: `'= 6.16'`.
    Exact,
    /// Pessimistic pin: `'~> 6.16'`.
    Pessimistic,
}

impl PinOperator {
    pub const ALL: [PinOperator; 3] = [
        PinOperator::Bare,
        PinOperator::Exact,
        PinOperator::Pessimistic,
    ];

    fn prefix(self) -> &'static str {
        match self {
            PinOperator::Bare => "",
            PinOperator::Exact => "= ",
            PinOperator::Pessimistic => "~> ",
        }
    }

    /// Operator written into the replacement literal.
    ///
    /// A pessimistic pin is rewritten to an exact pin so the resolved version
    /// cannot float past the target again.
    pub fn replacement(self) -> PinOperator {
        match self {
            PinOperator::Bare => PinOperator::Bare,
            PinOperator::Exact | PinOperator::Pessimistic => PinOperator::Exact,
        }
    }
}

/// One literal substitution: replace every occurrence of `old` with `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub old: String,
    pub new: String,
}

impl ReplacementRule {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

impl fmt::Display for ReplacementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old, self.new)
    }
}

/// Ordered table of replacement rules.
///
/// Every rule is attempted against every candidate manifest; rules are
/// independent and never short-circuit each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ReplacementRule>,
}

impl RuleSet {
    /// Build the quote × operator table for a dependency version pin.
    ///
    /// Covers both quote styles and the bare, `=`, and `~>` pin spellings, six
    /// rules in total. Adding a new quoting convention is a change here, not
    /// at the call sites.
    pub fn pin_dependency(dependency: &str, old_version: &str, new_version: &str) -> Self {
        let mut rules = Vec::new();
        for op in PinOperator::ALL {
            for quote in Quote::ALL {
                rules.push(ReplacementRule::new(
                    dependency_literal(quote, op, dependency, old_version),
                    dependency_literal(quote, op.replacement(), dependency, new_version),
                ));
            }
        }
        Self { rules }
    }

    pub fn from_rules(rules: Vec<ReplacementRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: ReplacementRule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplacementRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    /// The FBAudienceNetwork 6.16 -> 6.17.0 pin this tool was written for.
    fn default() -> Self {
        Self::pin_dependency("FBAudienceNetwork", "6.16", "6.17.0")
    }
}

fn dependency_literal(quote: Quote, op: PinOperator, dependency: &str, version: &str) -> String {
    let q = quote.ch();
    format!("{q}{dependency}{q}, {q}{}{version}{q}", op.prefix())
}
