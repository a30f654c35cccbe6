// src/report.rs

use std::{collections::HashMap, fmt};

use crate::table::RecipientTable;

pub const DEFAULT_TOP_N: usize = 10;

/// The two console aggregates printed at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// How many countries were asked for; `top_countries` may hold fewer.
    pub top_n: usize,
    /// `(country, total recipient_budget)`, largest first.
    pub top_countries: Vec<(String, f64)>,
    /// `(region, row count)`, largest first.
    pub region_counts: Vec<(String, usize)>,
}

/// Sum budgets per country and count rows per region. Null budgets add
/// nothing; rows with no country name are not ranked. Ties break on name.
pub fn summarize(table: &RecipientTable, top_n: usize) -> Summary {
    let mut budgets: HashMap<&str, f64> = HashMap::new();
    let mut regions: HashMap<&str, usize> = HashMap::new();

    for row in table.rows() {
        if let Some(country) = row.country.as_deref() {
            *budgets.entry(country).or_insert(0.0) += row.recipient_budget.unwrap_or(0.0);
        }
        *regions.entry(row.region.as_str()).or_insert(0) += 1;
    }

    let mut top_countries: Vec<(String, f64)> = budgets
        .into_iter()
        .map(|(c, total)| (c.to_string(), total))
        .collect();
    top_countries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_countries.truncate(top_n);

    let mut region_counts: Vec<(String, usize)> = regions
        .into_iter()
        .map(|(r, n)| (r.to_string(), n))
        .collect();
    region_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Summary {
        top_n,
        top_countries,
        region_counts,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Top {} Countries by Total Recipient Budget ===",
            self.top_n
        )?;
        let width = self
            .top_countries
            .iter()
            .map(|(c, _)| c.chars().count())
            .max()
            .unwrap_or(0);
        for (country, total) in &self.top_countries {
            writeln!(f, "{:<width$}  {:>18.2}", country, total, width = width)?;
        }

        writeln!(f)?;
        writeln!(f, "=== Number of Rows per Region ===")?;
        let width = self
            .region_counts
            .iter()
            .map(|(r, _)| r.chars().count())
            .max()
            .unwrap_or(0);
        for (region, count) in &self.region_counts {
            writeln!(f, "{:<width$}  {:>6}", region, count, width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RecipientRow;

    fn row(country: Option<&str>, region: &str, budget: Option<f64>) -> RecipientRow {
        RecipientRow {
            iso3: "XXX".into(),
            recipient_budget: budget,
            recipient_expense: None,
            sdg_code: "1".into(),
            sdg_name: None,
            country: country.map(String::from),
            capital: "Capital".into(),
            region: region.into(),
            continents: "Somewhere".into(),
        }
    }

    #[test]
    fn test_budgets_summed_and_ranked() {
        let table = RecipientTable::new(vec![
            row(Some("Kenya"), "Africa", Some(10.0)),
            row(Some("Peru"), "Americas", Some(25.0)),
            row(Some("Kenya"), "Africa", Some(20.0)),
            row(Some("Chad"), "Africa", None),
            row(None, "Asia", Some(999.0)),
        ]);

        let summary = summarize(&table, 10);
        assert_eq!(
            summary.top_countries,
            vec![
                ("Kenya".to_string(), 30.0),
                ("Peru".to_string(), 25.0),
                ("Chad".to_string(), 0.0)
            ]
        );
        assert_eq!(
            summary.region_counts,
            vec![
                ("Africa".to_string(), 3),
                ("Americas".to_string(), 1),
                ("Asia".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_top_n_truncates_with_name_tiebreak() {
        let table = RecipientTable::new(vec![
            row(Some("Benin"), "Africa", Some(5.0)),
            row(Some("Angola"), "Africa", Some(5.0)),
            row(Some("Cuba"), "Americas", Some(1.0)),
        ]);
        let summary = summarize(&table, 2);
        let names: Vec<&str> = summary.top_countries.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["Angola", "Benin"]);
    }

    #[test]
    fn test_display_has_both_sections() {
        let table = RecipientTable::new(vec![row(Some("Kenya"), "Africa", Some(12.5))]);
        let text = summarize(&table, DEFAULT_TOP_N).to_string();
        assert!(text.contains("=== Top 10 Countries by Total Recipient Budget ==="));
        assert!(text.contains("Kenya"));
        assert!(text.contains("12.50"));
        assert!(text.contains("=== Number of Rows per Region ==="));
    }

    #[test]
    fn test_infinite_budget_ranks_first() {
        let table = RecipientTable::new(vec![
            row(Some("Angola"), "Africa", Some(3.0)),
            row(Some("Benin"), "Africa", Some(f64::INFINITY)),
            row(Some("Chad"), "Africa", Some(5.0)),
        ]);
        let summary = summarize(&table, 10);
        let names: Vec<&str> = summary.top_countries.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["Benin", "Chad", "Angola"]);
    }

    #[test]
    fn test_empty_table() {
        let summary = summarize(&RecipientTable::default(), DEFAULT_TOP_N);
        assert!(summary.top_countries.is_empty());
        assert!(summary.region_counts.is_empty());
    }
}
