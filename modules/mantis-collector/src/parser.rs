//! Regex-driven record parser, compiled once from a config's `ParserSpec`.

use regex::Regex;

use mantis_common::{Group, MantisError, ParserSpec, Record, Tag};

use crate::traits::RecordParser;

#[derive(Debug, Clone)]
pub struct RegexParser {
    tags: Vec<(String, Regex)>,
    groups: Vec<(String, Regex)>,
}

impl RegexParser {
    /// Compile every rule. Group patterns must have at least one named capture,
    /// since the capture names become the attribute names.
    pub fn compile(spec: &ParserSpec) -> Result<Self, MantisError> {
        let tags = spec
            .tags
            .iter()
            .map(|rule| Ok((rule.name.clone(), compile_pattern(&rule.name, &rule.pattern)?)))
            .collect::<Result<Vec<_>, MantisError>>()?;

        let groups = spec
            .groups
            .iter()
            .map(|rule| {
                let re = compile_pattern(&rule.name, &rule.pattern)?;
                if re.capture_names().flatten().next().is_none() {
                    return Err(MantisError::Parser(format!(
                        "group {:?} pattern has no named captures",
                        rule.name
                    )));
                }
                Ok((rule.name.clone(), re))
            })
            .collect::<Result<Vec<_>, MantisError>>()?;

        Ok(Self { tags, groups })
    }
}

fn compile_pattern(name: &str, pattern: &str) -> Result<Regex, MantisError> {
    Regex::new(pattern).map_err(|e| MantisError::Parser(format!("rule {name:?}: {e}")))
}

impl RecordParser for RegexParser {
    fn parse(&self, body: &str) -> Record {
        let tags = self
            .tags
            .iter()
            .filter_map(|(name, re)| {
                let caps = re.captures(body)?;
                let m = caps.get(1).or_else(|| caps.get(0))?;
                Some(Tag::new(name.as_str(), m.as_str().trim()))
            })
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|(name, re)| Group {
                name: name.clone(),
                rows: re
                    .captures_iter(body)
                    .map(|caps| {
                        re.capture_names()
                            .flatten()
                            .filter_map(|field| {
                                caps.name(field)
                                    .map(|m| Tag::new(field, m.as_str().trim()))
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();

        Record { tags, groups }
    }
}
