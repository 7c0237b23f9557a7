//! Rule registration and the linking pass that turns [`Expr`] trees into a
//! [`Definition`].

use std::sync::atomic::{AtomicU32, Ordering};

use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use super::definition::Definition;
use super::errors::GrammarError;
use super::expr::Expr;
use super::node::{Node, NodeId, NodeKind, Rule};
use crate::token::{LanguageId, RuleId};
use crate::trie::{KeywordMap, PrefixTree, fold_case};

/// Process-wide language counter, one id per built definition.
static NEXT_LANGUAGE: AtomicU32 = AtomicU32::new(1);

#[derive(Debug)]
struct RuleDecl {
    name: SmolStr,
    expr: Expr,
    is_void: bool,
    token_type: Option<u32>,
}

/// Collects rules and state declarations, then links them with [`build`](Self::build).
///
/// Rules may reference each other in any order; names are only resolved
/// when the definition is built. The first rule defined is the entry rule
/// unless [`entry`](Self::entry) picks another one.
#[derive(Debug)]
pub struct DefinitionBuilder {
    name: SmolStr,
    case_sensitive: bool,
    rules: Vec<RuleDecl>,
    entry: Option<SmolStr>,
    flags: IndexMap<SmolStr, bool>,
    chars: IndexMap<SmolStr, char>,
    strings: IndexMap<SmolStr, SmolStr>,
    errors: Vec<GrammarError>,
}

impl DefinitionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            case_sensitive: true,
            rules: Vec::new(),
            entry: None,
            flags: IndexMap::new(),
            chars: IndexMap::new(),
            strings: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    /// Case handling for `string` and `keyword` nodes that don't choose explicitly.
    pub fn case_sensitive(&mut self, on: bool) -> &mut Self {
        self.case_sensitive = on;
        self
    }

    /// Define a rule producing tokens typed with its own id.
    pub fn define(&mut self, name: &str, expr: Expr) -> RuleId {
        self.push_rule(name.into(), expr, false, None)
    }

    /// Define a rule that produces no token; its children join the enclosing token.
    pub fn define_void(&mut self, name: &str, expr: Expr) -> RuleId {
        self.push_rule(name.into(), expr, true, None)
    }

    /// Define a rule stamping `token_type` on its tokens.
    pub fn define_typed(&mut self, name: &str, token_type: u32, expr: Expr) -> RuleId {
        self.push_rule(name.into(), expr, false, Some(token_type))
    }

    /// Define a rule named after the definition itself and make it the entry.
    pub fn define_self(&mut self, expr: Expr) -> RuleId {
        let name = self.name.clone();
        if self.entry.is_none() {
            self.entry = Some(name.clone());
        }
        self.push_rule(name, expr, false, None)
    }

    /// Make `name` the entry rule.
    pub fn entry(&mut self, name: &str) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    pub fn state_flag(&mut self, name: &str, default: bool) -> usize {
        let grammar = self.name.clone();
        declare(&mut self.flags, &mut self.errors, grammar, "flag", name, default)
    }

    pub fn state_char(&mut self, name: &str, default: char) -> usize {
        let grammar = self.name.clone();
        declare(&mut self.chars, &mut self.errors, grammar, "char", name, default)
    }

    pub fn state_string(&mut self, name: &str, default: &str) -> usize {
        let grammar = self.name.clone();
        declare(
            &mut self.strings,
            &mut self.errors,
            grammar,
            "string",
            name,
            default.into(),
        )
    }

    fn push_rule(&mut self, name: SmolStr, expr: Expr, is_void: bool, token_type: Option<u32>) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(RuleDecl {
            name,
            expr,
            is_void,
            token_type,
        });
        id
    }

    /// Lower every rule, resolve every name and freeze the result.
    pub fn build(self) -> Result<Definition, GrammarError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut rule_by_name = PrefixTree::new();
        for (index, decl) in self.rules.iter().enumerate() {
            if rule_by_name
                .insert(decl.name.chars(), RuleId(index as u32))
                .is_some()
            {
                return Err(GrammarError::DuplicateRule {
                    grammar: self.name.clone(),
                    name: decl.name.clone(),
                });
            }
        }

        let entry = match &self.entry {
            Some(name) => *rule_by_name
                .get(name.chars())
                .ok_or_else(|| GrammarError::UndefinedRule {
                    grammar: self.name.clone(),
                    name: name.clone(),
                })?,
            None if self.rules.is_empty() => {
                return Err(GrammarError::MissingEntry {
                    grammar: self.name.clone(),
                });
            }
            None => RuleId(0),
        };

        let mut linker = Linker {
            grammar: &self.name,
            case_sensitive: self.case_sensitive,
            rule_by_name: &rule_by_name,
            flags: &self.flags,
            chars: &self.chars,
            strings: &self.strings,
            nodes: Vec::new(),
            keywords: PrefixTree::new(),
            pending_keywords: Vec::new(),
        };

        let mut rules = Vec::with_capacity(self.rules.len());
        for (index, decl) in self.rules.into_iter().enumerate() {
            let id = RuleId(index as u32);
            let entry = linker.lower(decl.expr, None)?;
            rules.push(Rule {
                name: decl.name,
                id,
                entry,
                is_void: decl.is_void,
                token_type: decl.token_type.unwrap_or_else(|| id.as_token_type()),
            });
        }
        linker.patch_keywords()?;

        let Linker {
            nodes, keywords, ..
        } = linker;
        let language = LanguageId(NEXT_LANGUAGE.fetch_add(1, Ordering::Relaxed));

        tracing::debug!(
            "[GRAMMAR] linked '{}': {} rules, {} nodes, {} keywords, language={}",
            self.name,
            rules.len(),
            nodes.len(),
            keywords.len(),
            language.get()
        );

        Ok(Definition {
            name: self.name,
            language,
            nodes,
            rules,
            rule_by_name,
            keywords,
            entry,
            flags: self.flags,
            chars: self.chars,
            strings: self
                .strings
                .into_iter()
                .map(|(name, value)| (name, value.chars().collect()))
                .collect(),
        })
    }
}

fn declare<T>(
    slots: &mut IndexMap<SmolStr, T>,
    errors: &mut Vec<GrammarError>,
    grammar: SmolStr,
    kind: &'static str,
    name: &str,
    default: T,
) -> usize {
    match slots.entry(name.into()) {
        Entry::Occupied(slot) => {
            errors.push(GrammarError::DuplicateState {
                grammar,
                kind,
                name: name.into(),
            });
            slot.index()
        }
        Entry::Vacant(slot) => {
            let index = slot.index();
            slot.insert(default);
            index
        }
    }
}

/// Lowering context: appends nodes in continuation-passing order.
struct Linker<'a> {
    grammar: &'a SmolStr,
    case_sensitive: bool,
    rule_by_name: &'a PrefixTree<char, RuleId>,
    flags: &'a IndexMap<SmolStr, bool>,
    chars: &'a IndexMap<SmolStr, char>,
    strings: &'a IndexMap<SmolStr, SmolStr>,
    nodes: Vec<Node>,
    keywords: KeywordMap,
    pending_keywords: Vec<(NodeId, SmolStr)>,
}

impl Linker<'_> {
    fn push(&mut self, kind: NodeKind, next: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, next });
        id
    }

    /// Lower `expr` so that it continues with `next`, returning its first node.
    fn lower(&mut self, expr: Expr, next: Option<NodeId>) -> Result<NodeId, GrammarError> {
        let kind = match expr {
            Expr::Glue(items) => {
                let mut head = next;
                for item in items.into_iter().rev() {
                    head = Some(self.lower(item, head)?);
                }
                return Ok(match head {
                    Some(head) => head,
                    None => self.push(NodeKind::Pass, None),
                });
            }
            Expr::Char { ch, invert } => NodeKind::Char { ch, invert },
            Expr::Any => NodeKind::Any,
            Expr::Range { a, b, invert } => NodeKind::Range { a, b, invert },
            Expr::Set { chars, invert } => NodeKind::Set { chars, invert },
            Expr::Class(class) => NodeKind::Class(class),
            Expr::String {
                text,
                case_sensitive,
            } => {
                let fold = !case_sensitive.unwrap_or(self.case_sensitive);
                let text = if fold {
                    text.iter().copied().map(fold_case).collect()
                } else {
                    text
                };
                NodeKind::String { text, fold }
            }
            Expr::Keyword {
                words,
                case_sensitive,
            } => {
                let mut map = if case_sensitive.unwrap_or(self.case_sensitive) {
                    KeywordMap::new()
                } else {
                    KeywordMap::case_insensitive()
                };
                for word in &words {
                    let next_id = self.keywords.len() as u32;
                    let id = match self.keywords.insert(word.chars(), next_id) {
                        Some(&existing) => existing,
                        None => next_id,
                    };
                    map.insert(word.chars(), id);
                }
                NodeKind::Keyword { map: Box::new(map) }
            }
            Expr::Repeat { min, max, entry } => {
                self.check_bounds(min, max)?;
                let entry = self.lower(*entry, None)?;
                NodeKind::Repeat { min, max, entry }
            }
            Expr::Boi => NodeKind::Boi,
            Expr::Eoi => NodeKind::Eoi,
            Expr::Pass => NodeKind::Pass,
            Expr::Fail => NodeKind::Fail,
            Expr::Ahead { entry, invert } => NodeKind::Ahead {
                entry: self.lower(*entry, None)?,
                invert,
            },
            Expr::Find(entry) => NodeKind::Find {
                entry: self.lower(*entry, None)?,
            },
            Expr::Or(first, second) => NodeKind::Or {
                first: self.lower(*first, None)?,
                second: self.lower(*second, None)?,
            },
            Expr::Length { min, max, entry } => {
                self.check_bounds(min, max)?;
                let entry = self.lower(*entry, None)?;
                NodeKind::Length { min, max, entry }
            }
            Expr::Ref(name) => NodeKind::Ref {
                rule: self.rule(&name)?,
            },
            Expr::Inline(name) => NodeKind::Inline {
                rule: self.rule(&name)?,
            },
            Expr::Previous { rule, keyword } => {
                let kind = NodeKind::Previous {
                    rule: self.rule(&rule)?,
                    keyword: None,
                };
                let id = self.push(kind, next);
                if let Some(keyword) = keyword {
                    self.pending_keywords.push((id, keyword));
                }
                return Ok(id);
            }
            Expr::Call(callback) => NodeKind::Call(callback),
            Expr::SetFlag { name, value } => NodeKind::SetFlag {
                flag: self.slot(self.flags, "flag", &name)?,
                value,
            },
            Expr::IfFlag {
                name,
                then,
                otherwise,
            } => {
                let flag = self.slot(self.flags, "flag", &name)?;
                let then = self.lower(*then, None)?;
                let otherwise = match otherwise {
                    Some(otherwise) => Some(self.lower(*otherwise, None)?),
                    None => None,
                };
                NodeKind::IfFlag {
                    flag,
                    then,
                    otherwise,
                }
            }
            Expr::GetChar(name) => NodeKind::GetChar {
                slot: self.slot(self.chars, "char", &name)?,
            },
            Expr::SetChar { name, value } => NodeKind::SetChar {
                slot: self.slot(self.chars, "char", &name)?,
                value,
            },
            Expr::VarChar { name, invert } => NodeKind::VarChar {
                slot: self.slot(self.chars, "char", &name)?,
                invert,
            },
            Expr::GetString { name, coverage } => {
                let slot = self.slot(self.strings, "string", &name)?;
                let coverage = self.lower(*coverage, None)?;
                NodeKind::GetString { slot, coverage }
            }
            Expr::SetString { name, value } => NodeKind::SetString {
                slot: self.slot(self.strings, "string", &name)?,
                value: value.chars().collect(),
            },
            Expr::VarString(name) => NodeKind::VarString {
                slot: self.slot(self.strings, "string", &name)?,
            },
            Expr::Invoke {
                definition,
                coverage,
            } => {
                let coverage = match coverage {
                    Some(coverage) => Some(self.lower(*coverage, None)?),
                    None => None,
                };
                NodeKind::Invoke {
                    definition,
                    coverage,
                }
            }
            Expr::Echo(message) => NodeKind::Echo(message),
            Expr::Error(message) => NodeKind::Error(message),
        };
        Ok(self.push(kind, next))
    }

    fn rule(&self, name: &str) -> Result<RuleId, GrammarError> {
        self.rule_by_name
            .get(name.chars())
            .copied()
            .ok_or_else(|| GrammarError::UndefinedRule {
                grammar: self.grammar.clone(),
                name: name.into(),
            })
    }

    fn slot<T>(
        &self,
        slots: &IndexMap<SmolStr, T>,
        kind: &'static str,
        name: &str,
    ) -> Result<usize, GrammarError> {
        slots
            .get_index_of(name)
            .ok_or_else(|| GrammarError::UndefinedState {
                grammar: self.grammar.clone(),
                kind,
                name: name.into(),
            })
    }

    fn check_bounds(&self, min: usize, max: usize) -> Result<(), GrammarError> {
        if min > max {
            return Err(GrammarError::InvalidBounds {
                grammar: self.grammar.clone(),
                min,
                max,
            });
        }
        Ok(())
    }

    /// Resolve `previous_keyword` names against the complete keyword table.
    fn patch_keywords(&mut self) -> Result<(), GrammarError> {
        for (id, name) in std::mem::take(&mut self.pending_keywords) {
            let Some(&keyword) = self.keywords.get(name.chars()) else {
                return Err(GrammarError::UndefinedKeyword {
                    grammar: self.grammar.clone(),
                    name,
                });
            };
            if let NodeKind::Previous { keyword: slot, .. } = &mut self.nodes[id.index()].kind {
                *slot = Some(keyword);
            }
        }
        Ok(())
    }
}
