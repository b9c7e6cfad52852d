//! Schema reconciliation across PDF pages
//!
//! The first page defines the canonical column list. A page with a different
//! column set is malformed; the only repair is splitting a column whose name
//! joins several canonical names with whitespace, such as
//! `"card_number expiry_date"`, back into those columns. Repair rules are
//! either declared up front or inferred from the page header.

use crate::error::CleaningError;
use crate::frame::{column_names, column_set, has_column, reorder, text_values};
use eyre::Result;
use polars::prelude::*;
use std::collections::HashSet;

/// Split one merged column into its parts on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedColumnRule {
    merged: String,
    parts: Vec<String>,
}

impl MergedColumnRule {
    /// Rule for the column named by joining `parts` with a single space.
    pub fn new(parts: &[&str]) -> Self {
        Self {
            merged: parts.join(" "),
            parts: parts.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn merged(&self) -> &str {
        &self.merged
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Infer a rule from a page column that is not canonical.
    ///
    /// The name must split into two or more canonical columns, none of
    /// which the page already has.
    pub fn infer(name: &str, canonical: &HashSet<&str>, page: &DataFrame) -> Option<Self> {
        let parts: Vec<&str> = name.split_whitespace().collect();
        let is_merge = parts.len() > 1
            && parts
                .iter()
                .all(|p| canonical.contains(p) && !has_column(page, p));
        is_merge.then(|| Self {
            merged: name.to_string(),
            parts: parts.into_iter().map(String::from).collect(),
        })
    }

    /// Split a single merged value. The last part takes any remainder.
    pub fn split_value(&self, value: Option<&str>) -> Vec<Option<String>> {
        let Some(text) = value else {
            return vec![None; self.parts.len()];
        };

        let mut pieces = text.split_whitespace();
        let mut values: Vec<Option<String>> = (0..self.parts.len().saturating_sub(1))
            .map(|_| pieces.next().map(String::from))
            .collect();
        let rest = pieces.collect::<Vec<_>>().join(" ");
        values.push((!rest.is_empty()).then_some(rest));
        values
    }

    /// Apply the rule to a page; returns false when the page has no merged column.
    pub fn apply(&self, page: &mut DataFrame) -> Result<bool> {
        let Ok(merged) = page.drop_in_place(&self.merged) else {
            return Ok(false);
        };

        let values = text_values(merged.as_materialized_series())?;
        let mut split: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(values.len()); self.parts.len()];
        for value in &values {
            for (column, piece) in split.iter_mut().zip(self.split_value(value.as_deref())) {
                column.push(piece);
            }
        }

        for (name, values) in self.parts.iter().zip(split) {
            page.with_column(Series::new(name.as_str().into(), values))?;
        }
        Ok(true)
    }
}

/// Brings every page to the first page's column layout.
#[derive(Debug, Clone, Default)]
pub struct SchemaReconciler {
    rules: Vec<MergedColumnRule>,
}

impl SchemaReconciler {
    /// A reconciler that only uses rules inferred from page headers
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a rule to try before inference
    pub fn with_rule(mut self, rule: MergedColumnRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Whether `page` has a different column set from `canonical`.
    pub fn is_malformed(page: &DataFrame, canonical: &[String]) -> bool {
        let expected: HashSet<String> = canonical.iter().cloned().collect();
        column_set(page) != expected
    }

    /// Repair malformed pages and order every page's columns canonically.
    ///
    /// # Errors
    /// [`CleaningError::SchemaMismatch`] for a page that still differs after repair.
    pub fn reconcile(&self, pages: Vec<DataFrame>) -> Result<Vec<DataFrame>> {
        let Some(first) = pages.first() else {
            return Ok(pages);
        };
        let canonical = column_names(first);

        pages
            .into_iter()
            .enumerate()
            .map(|(index, mut page)| {
                if Self::is_malformed(&page, &canonical) {
                    log::warn!(
                        "Page {} has columns [{}], repairing",
                        index,
                        column_names(&page).join(", ")
                    );
                    self.repair(&mut page, &canonical)?;
                    if Self::is_malformed(&page, &canonical) {
                        return Err(CleaningError::SchemaMismatch {
                            page: index,
                            expected: canonical.join(", "),
                            found: column_names(&page).join(", "),
                        }
                        .into());
                    }
                }
                reorder(&page, &canonical)
            })
            .collect()
    }

    fn repair(&self, page: &mut DataFrame, canonical: &[String]) -> Result<()> {
        for rule in &self.rules {
            if rule.apply(page)? {
                log::debug!("Split '{}' with declared rule", rule.merged());
            }
        }

        let expected: HashSet<&str> = canonical.iter().map(String::as_str).collect();
        let view: &DataFrame = page;
        let inferred: Vec<MergedColumnRule> = column_names(view)
            .iter()
            .filter(|name| !expected.contains(name.as_str()))
            .filter_map(|name| MergedColumnRule::infer(name, &expected, view))
            .collect();

        for rule in inferred {
            if rule.apply(page)? {
                log::debug!("Split '{}' into [{}]", rule.merged(), rule.parts().join(", "));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::require;

    const CANONICAL: [&str; 4] = [
        "card_number",
        "expiry_date",
        "card_provider",
        "date_payment_confirmed",
    ];

    fn good_page() -> DataFrame {
        df!(
            "card_number" => ["4971858637664481"],
            "expiry_date" => ["09/26"],
            "card_provider" => ["VISA 16 digit"],
            "date_payment_confirmed" => ["2015-11-25"],
        )
        .unwrap()
    }

    fn merged_page() -> DataFrame {
        df!(
            "card_number expiry_date" => ["4000123412341234 04/26"],
            "card_provider" => ["VISA 16 digit"],
            "date_payment_confirmed" => ["2019-05-12"],
        )
        .unwrap()
    }

    fn cell(page: &DataFrame, column: &str) -> Option<String> {
        text_values(require(page, column).unwrap()).unwrap().remove(0)
    }

    #[test]
    fn test_split_value() {
        let rule = MergedColumnRule::new(&["card_number", "expiry_date"]);
        assert_eq!(rule.merged(), "card_number expiry_date");
        assert_eq!(
            rule.split_value(Some("4000123412341234 04/26")),
            vec![Some("4000123412341234".to_string()), Some("04/26".to_string())]
        );
        assert_eq!(
            rule.split_value(Some("4000123412341234")),
            vec![Some("4000123412341234".to_string()), None]
        );
        assert_eq!(rule.split_value(None), vec![None, None]);
    }

    #[test]
    fn test_repairs_merged_page() {
        let pages = SchemaReconciler::new()
            .reconcile(vec![good_page(), merged_page()])
            .unwrap();

        let repaired = &pages[1];
        assert_eq!(column_names(repaired), CANONICAL.to_vec());
        assert_eq!(cell(repaired, "card_number").as_deref(), Some("4000123412341234"));
        assert_eq!(cell(repaired, "expiry_date").as_deref(), Some("04/26"));
    }

    #[test]
    fn test_declared_rule() {
        let reconciler = SchemaReconciler::new()
            .with_rule(MergedColumnRule::new(&["card_number", "expiry_date"]));
        let pages = reconciler.reconcile(vec![good_page(), merged_page()]).unwrap();
        assert!(!SchemaReconciler::is_malformed(
            &pages[1],
            &CANONICAL.map(String::from)
        ));
    }

    #[test]
    fn test_reorders_shuffled_page() {
        let shuffled = reorder(
            &good_page(),
            &[
                "card_provider",
                "card_number",
                "date_payment_confirmed",
                "expiry_date",
            ],
        )
        .unwrap();

        let pages = SchemaReconciler::new()
            .reconcile(vec![good_page(), shuffled])
            .unwrap();
        assert_eq!(column_names(&pages[1]), CANONICAL.to_vec());
        assert!(pages[1].equals_missing(&pages[0]));
    }

    #[test]
    fn test_unrepairable_page() {
        let other = df!("card_number" => ["1"], "cvv" => ["123"]).unwrap();
        let err = SchemaReconciler::new()
            .reconcile(vec![good_page(), other])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CleaningError>(),
            Some(CleaningError::SchemaMismatch { page: 1, .. })
        ));
    }
}
