//! Top-level operations and their typed argument records.
//!
//! Each operation with argument-dependent behavior is a variant of
//! [`Operation`]. Its record is decoded from [`BoundArguments`] and its
//! rewrite is a match arm in [`Operation::rewrite`].

use std::{fmt, str::FromStr};

use super::{arguments::BoundArguments, errors::ElaborationError};
use crate::{
    config::{ElaboratorConfig, RangePredicate},
    query_planner::{
        combinators::{and, eql, gt_eql, in_list, like, lt, not},
        operator::{Operator, OrderItem},
    },
    value::Literal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Country,
    City,
    Language,
    Countries,
    Cities,
    Search,
    Languages,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Country,
        OperationKind::City,
        OperationKind::Language,
        OperationKind::Countries,
        OperationKind::Cities,
        OperationKind::Search,
        OperationKind::Languages,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Country => "country",
            OperationKind::City => "city",
            OperationKind::Language => "language",
            OperationKind::Countries => "countries",
            OperationKind::Cities => "cities",
            OperationKind::Search => "search",
            OperationKind::Languages => "languages",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names without a rewrite rule are not an error: they elaborate to
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoRewriteRule(pub String);

impl FromStr for OperationKind {
    type Err = NoRewriteRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| NoRewriteRule(s.to_string()))
    }
}

/// Lookup of one entity by its unique key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLookupArgs {
    pub key: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountriesArgs {
    /// `< 1` means unlimited
    pub limit: i64,
    /// `0` means unfiltered
    pub min_population: i64,
    pub by_population: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CitiesArgs {
    pub name_pattern: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchArgs {
    pub min_population: i64,
    pub indep_since: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguagesArgs {
    /// `None` selects every language
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Country(KeyLookupArgs),
    City(KeyLookupArgs),
    Language(KeyLookupArgs),
    Countries(CountriesArgs),
    Cities(CitiesArgs),
    Search(SearchArgs),
    Languages(LanguagesArgs),
}

impl Operation {
    pub fn decode(kind: OperationKind, args: &BoundArguments) -> Result<Self, ElaborationError> {
        Ok(match kind {
            OperationKind::Country => Operation::Country(KeyLookupArgs {
                key: Literal::String(args.string("code")?),
            }),
            OperationKind::City => Operation::City(KeyLookupArgs {
                key: Literal::Int(args.int("id")?),
            }),
            OperationKind::Language => Operation::Language(KeyLookupArgs {
                key: Literal::String(args.string("language")?),
            }),
            OperationKind::Countries => Operation::Countries(CountriesArgs {
                limit: args.int("limit")?,
                min_population: args.int("minPopulation")?,
                by_population: args.boolean("byPopulation")?,
            }),
            OperationKind::Cities => Operation::Cities(CitiesArgs {
                name_pattern: args.string("namePattern")?,
            }),
            OperationKind::Search => Operation::Search(SearchArgs {
                min_population: args.int("minPopulation")?,
                indep_since: args.int("indepSince")?,
            }),
            OperationKind::Languages => Operation::Languages(LanguagesArgs {
                languages: args.optional_string_list("languages")?,
            }),
        })
    }

    /// Wrap `child` in the operators this operation's arguments call for.
    pub fn rewrite(self, child: Operator, config: &ElaboratorConfig) -> Operator {
        match self {
            Operation::Country(KeyLookupArgs { key }) => child.unique(eql("code", key)),
            Operation::City(KeyLookupArgs { key }) => child.unique(eql("id", key)),
            Operation::Language(KeyLookupArgs { key }) => child.unique(eql("language", key)),

            // Filter, then order, then limit, whatever order the arguments
            // came in.
            Operation::Countries(args) => {
                let filtered = if args.min_population == 0 {
                    child
                } else {
                    child.filter(gt_eql("population", args.min_population))
                };
                let ordered = if args.by_population {
                    filtered.order_by(vec![OrderItem::asc("population")])
                } else {
                    filtered
                };
                if args.limit < 1 {
                    ordered
                } else {
                    ordered.limit(args.limit as u64)
                }
            }

            Operation::Cities(CitiesArgs { name_pattern }) => child.filter(like(
                "name",
                name_pattern,
                config.case_sensitive_patterns,
            )),

            Operation::Search(SearchArgs {
                min_population,
                indep_since,
            }) => {
                let bounds = match config.range_predicate {
                    RangePredicate::NegatedLessThan => vec![
                        not(lt("population", min_population)),
                        not(lt("indepyear", indep_since)),
                    ],
                    RangePredicate::GreaterOrEqual => vec![
                        gt_eql("population", min_population),
                        gt_eql("indepyear", indep_since),
                    ],
                };
                match and(bounds) {
                    Some(predicate) => child.filter(predicate),
                    None => child,
                }
            }

            Operation::Languages(LanguagesArgs { languages }) => match languages {
                Some(languages) => child.filter(in_list(
                    "language",
                    languages.into_iter().map(Literal::String).collect(),
                )),
                None => child,
            },
        }
    }
}
