//! License classification.
//!
//! Decides whether a detected license string allows redistribution without
//! reciprocal obligations. Understands SPDX-style `OR`/`AND`/`WITH`
//! expressions and the `*` marker used for licenses guessed from file text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// License string used when nothing could be detected.
pub const UNKNOWN_LICENSE: &str = "UNKNOWN";

/// Identifiers treated as permissive out of the box.
pub const PERMISSIVE_LICENSES: &[&str] = &[
    "MIT",
    "MIT-0",
    "ISC",
    "BSD",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "0BSD",
    "Apache",
    "Apache-2.0",
    "Zlib",
    "Unlicense",
    "CC0-1.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "BlueOak-1.0.0",
    "Python-2.0",
    "WTFPL",
];

/// Classifies license expressions as permissive or not.
#[derive(Debug, Clone)]
pub struct LicensePolicy {
    permissive: HashSet<String>,
}

impl Default for LicensePolicy {
    fn default() -> Self {
        LicensePolicy::new(std::iter::empty::<&str>())
    }
}

impl LicensePolicy {
    /// Create a policy from the built-in list plus extra identifiers.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissive = PERMISSIVE_LICENSES
            .iter()
            .map(|id| id.to_ascii_lowercase())
            .chain(extra.into_iter().map(|id| id.as_ref().to_ascii_lowercase()))
            .collect();
        LicensePolicy { permissive }
    }

    /// Check whether a license expression is permissive.
    ///
    /// Unknown, unlicensed or unparsable expressions are not.
    pub fn is_permissive(&self, license: &str) -> bool {
        let tokens = tokenize(license);
        if tokens.is_empty() {
            return false;
        }
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
            policy: self,
        };
        match parser.parse_or() {
            Some(result) if parser.pos == tokens.len() => result,
            _ => false,
        }
    }

    fn is_permissive_id(&self, id: &str) -> bool {
        let id = id.trim_end_matches('*');
        self.permissive.contains(&id.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Word(&'a str),
}

fn tokenize(expr: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, ch) in expr.char_indices() {
        let is_delim = ch == '(' || ch == ')' || ch.is_whitespace();
        if is_delim {
            if let Some(s) = start.take() {
                tokens.push(Token::Word(&expr[s..i]));
            }
            match ch {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token::Word(&expr[s..]));
    }
    tokens
}

/// Recursive-descent evaluator: `or := and (OR and)*`, `and := atom (AND atom)*`,
/// `atom := '(' or ')' | id [WITH id]`.
struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    policy: &'t LicensePolicy,
}

impl ExprParser<'_, '_> {
    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn parse_or(&mut self) -> Option<bool> {
        let mut result = self.parse_and()?;
        while self.peek_keyword("OR") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            result = result || rhs;
        }
        Some(result)
    }

    fn parse_and(&mut self) -> Option<bool> {
        let mut result = self.parse_atom()?;
        while self.peek_keyword("AND") {
            self.pos += 1;
            let rhs = self.parse_atom()?;
            result = result && rhs;
        }
        Some(result)
    }

    fn parse_atom(&mut self) -> Option<bool> {
        match self.tokens.get(self.pos)? {
            Token::Open => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.tokens.get(self.pos) {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Some(inner)
                    }
                    _ => None,
                }
            }
            Token::Close => None,
            Token::Word(id) => {
                let id = *id;
                if ["OR", "AND", "WITH"].iter().any(|k| id.eq_ignore_ascii_case(k)) {
                    return None;
                }
                self.pos += 1;
                let permissive = self.policy.is_permissive_id(id);
                if self.peek_keyword("WITH") {
                    self.pos += 1;
                    match self.tokens.get(self.pos) {
                        Some(Token::Word(_)) => self.pos += 1,
                        _ => return None,
                    }
                }
                Some(permissive)
            }
        }
    }
}

/// Phrases identifying common license texts, most specific first.
static LICENSE_TEXT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"GNU LESSER GENERAL PUBLIC LICENSE", "LGPL"),
        (r"GNU AFFERO GENERAL PUBLIC LICENSE", "AGPL-3.0"),
        (r"GNU GENERAL PUBLIC LICENSE Version 3", "GPL-3.0"),
        (r"GNU GENERAL PUBLIC LICENSE Version 2", "GPL-2.0"),
        (r"Mozilla Public License,? (Version|v\.) 2\.0", "MPL-2.0"),
        (r"Apache License,? Version 2\.0", "Apache-2.0"),
        (r"This is free and unencumbered software released into the public domain", "Unlicense"),
        (r"Permission to use, copy, modify, and(/or)? distribute this software for any purpose with or without fee is hereby granted", "ISC"),
        (r"Permission is hereby granted, free of charge", "MIT"),
        (r"Redistribution and use in source and binary forms.*Neither the name", "BSD-3-Clause"),
        (r"Redistribution and use in source and binary forms", "BSD-2-Clause"),
    ]
    .into_iter()
    .map(|(phrase, id)| {
        // License files wrap lines arbitrarily.
        let pattern = format!("(?is){}", phrase.replace(' ', r"\s+"));
        (Regex::new(&pattern).expect("static license pattern"), id)
    })
    .collect()
});

/// Guess a license identifier from license file text.
pub fn sniff_license_text(text: &str) -> Option<&'static str> {
    LICENSE_TEXT_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, id)| *id)
}
