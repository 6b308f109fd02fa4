//! Rule nodes of a `grammar.json` rule graph.

use serde::Deserialize;

/// One node of a grammar's rule graph.
///
/// Which fields are set depends on [`RuleType`]: `SYMBOL` carries `name`,
/// `SEQ` and `CHOICE` carry `members`, wrappers carry `content`.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    /// The kind of rule.
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Literal text, pattern source, alias text, or precedence level.
    #[serde(default)]
    pub value: Option<RuleValue>,

    /// Referenced symbol or field name.
    #[serde(default)]
    pub name: Option<String>,

    /// Wrapped rule of a unary construct.
    #[serde(default)]
    pub content: Option<Box<Rule>>,

    /// Operands of `SEQ` and `CHOICE`.
    #[serde(default)]
    pub members: Vec<Rule>,

    /// For `ALIAS`: whether the alias produces a named node.
    #[serde(default)]
    pub named: Option<bool>,

    /// Regex flags of a `PATTERN`.
    #[serde(default)]
    pub flags: Option<String>,

    /// Reserved-word set of a `RESERVED` wrapper.
    #[serde(default)]
    pub context_name: Option<String>,
}

/// Scalar payload of a rule.
///
/// `PREC` levels are integers or, for named precedences, strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Text value.
    String(String),

    /// Precedence level.
    Integer(i32),
}

/// Rule kinds, named as in `grammar.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Empty production.
    Blank,
    /// Literal token.
    String,
    /// Regex token.
    Pattern,
    /// Reference to a rule or external.
    Symbol,
    /// Alternatives.
    Choice,
    /// Sequence.
    Seq,
    /// Zero or more.
    Repeat,
    /// One or more.
    Repeat1,
    /// Precedence.
    Prec,
    /// Left-associative precedence.
    PrecLeft,
    /// Right-associative precedence.
    PrecRight,
    /// Dynamic precedence.
    PrecDynamic,
    /// Named field.
    Field,
    /// Renamed node.
    Alias,
    /// Collapses its content into a single token.
    Token,
    /// Token that admits no preceding extras.
    ImmediateToken,
    /// Reserved-word context.
    Reserved,
}

impl Rule {
    /// Nested rules, whether held in `content` or `members`.
    pub fn children(&self) -> impl Iterator<Item = &Rule> {
        self.content.as_deref().into_iter().chain(self.members.iter())
    }

    /// Whether this rule collapses its content into one lexical token.
    #[must_use]
    pub fn is_token(&self) -> bool {
        matches!(self.rule_type, RuleType::Token | RuleType::ImmediateToken)
    }

    /// The referenced name of a `SYMBOL` rule.
    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        match self.rule_type {
            RuleType::Symbol => self.name.as_deref(),
            _ => None,
        }
    }

    /// The literal text of a `STRING` rule.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match (self.rule_type, &self.value) {
            (RuleType::String, Some(RuleValue::String(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The node name an `ALIAS` produces, with whether it is named.
    #[must_use]
    pub fn alias(&self) -> Option<(&str, bool)> {
        match (self.rule_type, &self.value) {
            (RuleType::Alias, Some(RuleValue::String(s))) => {
                Some((s.as_str(), self.named.unwrap_or(false)))
            }
            _ => None,
        }
    }

    /// Appends every symbol referenced anywhere below this rule.
    pub fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(name) = self.symbol_name() {
            out.push(name);
        }
        for child in self.children() {
            child.collect_symbols(out);
        }
    }

    /// Appends the string literals that become anonymous nodes: every
    /// `STRING` not swallowed by a `TOKEN` or `IMMEDIATE_TOKEN`.
    pub fn collect_literals<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_token() {
            if let Some(text) = self.content.as_deref().and_then(Rule::string_value) {
                out.push(text);
            }
            return;
        }
        if let Some(text) = self.string_value() {
            out.push(text);
        }
        for child in self.children() {
            child.collect_literals(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Rule {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_collect_symbols_through_wrappers() {
        let rule = parse(
            r#"{
                "type": "PREC_LEFT",
                "value": 1,
                "content": {
                    "type": "SEQ",
                    "members": [
                        { "type": "FIELD", "name": "left",
                          "content": { "type": "SYMBOL", "name": "expr" } },
                        { "type": "STRING", "value": "+" },
                        { "type": "SYMBOL", "name": "term" }
                    ]
                }
            }"#,
        );
        let mut symbols = Vec::new();
        rule.collect_symbols(&mut symbols);
        assert_eq!(symbols, ["expr", "term"]);
    }

    #[test]
    fn test_token_content_is_not_split() {
        let rule = parse(
            r#"{
                "type": "CHOICE",
                "members": [
                    { "type": "STRING", "value": "pass" },
                    { "type": "TOKEN", "content": {
                        "type": "SEQ",
                        "members": [
                            { "type": "STRING", "value": "//" },
                            { "type": "PATTERN", "value": ".*" }
                        ]
                    } },
                    { "type": "IMMEDIATE_TOKEN",
                      "content": { "type": "STRING", "value": "." } }
                ]
            }"#,
        );
        let mut literals = Vec::new();
        rule.collect_literals(&mut literals);
        assert_eq!(literals, ["pass", "."]);
    }

    #[test]
    fn test_alias_accessor() {
        let rule = parse(
            r#"{
                "type": "ALIAS",
                "value": "type_identifier",
                "named": true,
                "content": { "type": "SYMBOL", "name": "identifier" }
            }"#,
        );
        assert_eq!(rule.alias(), Some(("type_identifier", true)));
        assert_eq!(rule.symbol_name(), None);
    }
}
