//! Statute-type normalization onto the closed category set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize_key;
use crate::error::{Result, SalError};

/// Canonical statute categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatuteType {
    PublicLaw,
    PrivateLaw,
    Resolution,
    Act,
    Appendix,
    Proclamation,
    Treaty,
    Articles,
    Ordinance,
    /// Front matter, indexes, and other pages without a statute.
    SpecialPage,
}

impl StatuteType {
    pub const ALL: [StatuteType; 10] = [
        StatuteType::PublicLaw,
        StatuteType::PrivateLaw,
        StatuteType::Resolution,
        StatuteType::Act,
        StatuteType::Appendix,
        StatuteType::Proclamation,
        StatuteType::Treaty,
        StatuteType::Articles,
        StatuteType::Ordinance,
        StatuteType::SpecialPage,
    ];

    /// Canonical slug used in mapping tables and persisted records.
    pub fn slug(&self) -> &'static str {
        match self {
            StatuteType::PublicLaw => "public-law",
            StatuteType::PrivateLaw => "private-law",
            StatuteType::Resolution => "resolution",
            StatuteType::Act => "act",
            StatuteType::Appendix => "appendix",
            StatuteType::Proclamation => "proclamation",
            StatuteType::Treaty => "treaty",
            StatuteType::Articles => "articles",
            StatuteType::Ordinance => "ordinance",
            StatuteType::SpecialPage => "special-page",
        }
    }

    /// Display label used in generated citations.
    pub fn label(&self) -> &'static str {
        match self {
            StatuteType::PublicLaw => "Public Law",
            StatuteType::PrivateLaw => "Private Law",
            StatuteType::Resolution => "Resolution",
            StatuteType::Act => "Act",
            StatuteType::Appendix => "Appendix",
            StatuteType::Proclamation => "Proclamation",
            StatuteType::Treaty => "Treaty",
            StatuteType::Articles => "Articles",
            StatuteType::Ordinance => "Ordinance",
            StatuteType::SpecialPage => "Special Page",
        }
    }

    /// Look up a category by slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        let key = normalize_key(slug);
        Self::ALL.into_iter().find(|t| t.slug() == key)
    }

    /// Whether the legacy format prints a date for this category.
    pub fn is_dated(&self) -> bool {
        !matches!(
            self,
            StatuteType::Articles | StatuteType::Ordinance | StatuteType::SpecialPage
        )
    }

    /// Whether citations carry a Roman numeral derived from the chapter/number.
    pub fn is_numbered(&self) -> bool {
        matches!(
            self,
            StatuteType::Resolution | StatuteType::Act | StatuteType::Appendix
        )
    }

    pub fn is_law(&self) -> bool {
        matches!(self, StatuteType::PublicLaw | StatuteType::PrivateLaw)
    }
}

impl fmt::Display for StatuteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Public or private designation of a law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Parse a worksheet cell ("Public", "private", ...).
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_key(value).as_str() {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
        }
    }
}

/// Target of a statute mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MappedType {
    Fixed(StatuteType),
    /// Generic "law": resolved by the record's Public/Private column.
    Law,
}

/// Slug for the generic law target in mapping tables.
pub const LAW_SLUG: &str = "law";

/// Maps raw statute-type labels to canonical categories.
#[derive(Debug, Clone)]
pub struct StatuteTypeNormalizer {
    table: HashMap<String, MappedType>,
}

impl StatuteTypeNormalizer {
    /// Build from a raw-label → canonical-slug table.
    ///
    /// Canonical slugs always map to themselves. Values may also be `law`,
    /// which defers to the record's Public/Private designation.
    pub fn from_table<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut table: HashMap<String, MappedType> = StatuteType::ALL
            .into_iter()
            .map(|t| (t.slug().to_string(), MappedType::Fixed(t)))
            .collect();
        table.insert(LAW_SLUG.to_string(), MappedType::Law);

        for (raw, target) in entries {
            let mapped = if normalize_key(target) == LAW_SLUG {
                MappedType::Law
            } else {
                let statute_type = StatuteType::from_slug(target).ok_or_else(|| {
                    SalError::Config(format!(
                        "Statute mapping '{}' targets unknown category '{}'",
                        raw, target
                    ))
                })?;
                MappedType::Fixed(statute_type)
            };
            table.insert(normalize_key(raw), mapped);
        }

        Ok(Self { table })
    }

    /// Resolve a raw label for the record at spreadsheet `row`.
    ///
    /// `visibility` is consulted only when the label maps to the generic
    /// law category.
    pub fn normalize(
        &self,
        label: &str,
        visibility: Option<Visibility>,
        row: usize,
    ) -> Result<StatuteType> {
        let mapped = self
            .table
            .get(&normalize_key(label))
            .copied()
            .ok_or_else(|| SalError::StatuteTypeMapping {
                label: label.to_string(),
                row,
            })?;

        match mapped {
            MappedType::Fixed(statute_type) => Ok(statute_type),
            MappedType::Law => match visibility {
                Some(Visibility::Public) => Ok(StatuteType::PublicLaw),
                Some(Visibility::Private) => Ok(StatuteType::PrivateLaw),
                None => Err(SalError::invalid(
                    row,
                    "public_private",
                    format!(
                        "label '{}' is a law but the row has no Public/Private designation",
                        label.trim()
                    ),
                )),
            },
        }
    }

    /// Whether `label` has an entry, without resolving it.
    pub fn contains(&self, label: &str) -> bool {
        self.table.contains_key(&normalize_key(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> StatuteTypeNormalizer {
        StatuteTypeNormalizer::from_table([
            ("Pub.Res.", "resolution"),
            ("Public Resolution", "resolution"),
            ("Law", "law"),
            ("Pub. L.", "public-law"),
            ("Index", "special-page"),
        ])
        .unwrap()
    }

    #[test]
    fn test_mapped_labels() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Pub.Res.", None, 2).unwrap(),
            StatuteType::Resolution
        );
        assert_eq!(
            n.normalize(" public   RESOLUTION ", None, 2).unwrap(),
            StatuteType::Resolution
        );
        assert_eq!(
            n.normalize("Pub. L.", None, 2).unwrap(),
            StatuteType::PublicLaw
        );
    }

    #[test]
    fn test_slugs_map_to_themselves() {
        let n = normalizer();
        for t in StatuteType::ALL {
            assert_eq!(n.normalize(t.slug(), None, 2).unwrap(), t);
        }
    }

    #[test]
    fn test_law_uses_visibility() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Law", Some(Visibility::Private), 3).unwrap(),
            StatuteType::PrivateLaw
        );
        assert_eq!(
            n.normalize("law", Some(Visibility::Public), 3).unwrap(),
            StatuteType::PublicLaw
        );
        let err = n.normalize("Law", None, 3).unwrap_err();
        assert!(matches!(err, SalError::InvalidRecord { row: 3, .. }));
    }

    #[test]
    fn test_unmapped_label_carries_row() {
        let n = normalizer();
        match n.normalize("Pub Res", None, 17).unwrap_err() {
            SalError::StatuteTypeMapping { label, row } => {
                assert_eq!(label, "Pub Res");
                assert_eq!(row, 17);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_target_is_config_error() {
        let err = StatuteTypeNormalizer::from_table([("Res.", "resolutions")]).unwrap_err();
        assert!(matches!(err, SalError::Config(_)));
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!(Visibility::parse("Private"), Some(Visibility::Private));
        assert_eq!(Visibility::parse(" public "), Some(Visibility::Public));
        assert_eq!(Visibility::parse("both"), None);
    }

    #[test]
    fn test_category_traits() {
        assert!(StatuteType::Act.is_numbered());
        assert!(!StatuteType::PublicLaw.is_numbered());
        assert!(!StatuteType::Ordinance.is_dated());
        assert!(StatuteType::Treaty.is_dated());
        assert_eq!(StatuteType::from_slug("Special-Page"), Some(StatuteType::SpecialPage));
    }
}
