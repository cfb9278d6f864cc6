//! Post-scan consistency checks over the discovered candidate set.

use std::collections::HashMap;

use crate::analysis::names;
use crate::model::Candidate;

#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub candidates: Vec<Candidate>,
    /// Number of candidates carrying at least one reason.
    pub inconsistencies: usize,
}

/// Size key at 1/100 px so float noise does not split buckets.
fn size_key(candidate: &Candidate) -> (i64, i64) {
    ((candidate.width * 100.0).round() as i64, (candidate.height * 100.0).round() as i64)
}

fn format_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Annotate candidates with size, naming and duplicate findings.
pub fn analyze(candidates: Vec<Candidate>) -> ConsistencyReport {
    let mut size_counts: HashMap<(i64, i64), usize> = HashMap::new();
    for c in &candidates {
        *size_counts.entry(size_key(c)).or_default() += 1;
    }
    let dominant = size_counts.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)));
    let (dominant_key, dominant_count) = match dominant {
        Some((key, count)) => (*key, *count),
        None => ((0, 0), 0),
    };

    // pattern -> pages, one entry per candidate
    let mut pattern_pages: HashMap<String, Vec<String>> = HashMap::new();
    for c in &candidates {
        let pattern = names::normalized_pattern(&c.name);
        if !pattern.is_empty() {
            pattern_pages.entry(pattern).or_default().push(c.page.clone());
        }
    }

    let mut inconsistencies = 0;
    let annotated = candidates
        .into_iter()
        .map(|mut c| {
            let mut reasons = Vec::new();

            let count = size_counts.get(&size_key(&c)).copied().unwrap_or(0);
            if (count as f64) < dominant_count as f64 / 2.0 {
                reasons.push(format!(
                    "Unusual size {}x{} (most icons are {}x{})",
                    format_px(c.width),
                    format_px(c.height),
                    format_px(dominant_key.0 as f64 / 100.0),
                    format_px(dominant_key.1 as f64 / 100.0),
                ));
            }

            if names::is_default_layer_name(&c.name) {
                reasons.push(format!("Default layer name \"{}\"", c.name));
            } else if !names::is_well_formed_name(&c.name) {
                reasons.push(format!("Name \"{}\" does not follow naming conventions", c.name));
            }

            let pattern = names::normalized_pattern(&c.name);
            if let Some(pages) = pattern_pages.get(&pattern) {
                let same_page = pages.iter().filter(|p| **p == c.page).count();
                if same_page >= 2 {
                    reasons.push(format!("Possible duplicate on page \"{}\"", c.page));
                }
                if pages.len() >= 2 {
                    reasons.push(format!(
                        "Icon pattern \"{pattern}\" is used by {} icons in the document",
                        pages.len()
                    ));
                }
            }

            c.has_inconsistency = !reasons.is_empty();
            if c.has_inconsistency {
                inconsistencies += 1;
            }
            c.inconsistency_reasons = reasons;
            c
        })
        .collect();

    ConsistencyReport { candidates: annotated, inconsistencies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateStatus, NodeId, NodeKind};

    fn candidate(id: &str, name: &str, page: &str, size: f64) -> Candidate {
        Candidate {
            node_id: NodeId::new(id),
            name: name.into(),
            kind: NodeKind::Frame,
            width: size,
            height: size,
            page: page.into(),
            frame_context: None,
            source: "local".into(),
            status: CandidateStatus::Unresolved,
            master_id: None,
            score: 4.0,
            has_inconsistency: false,
            inconsistency_reasons: vec![],
            is_marked_for_swap: false,
        }
    }

    #[test]
    fn flags_size_outliers_against_dominant_bucket() {
        let report = analyze(vec![
            candidate("1", "home", "A", 24.0),
            candidate("2", "search", "A", 24.0),
            candidate("3", "bell", "A", 24.0),
            candidate("4", "star", "A", 13.0),
        ]);
        let outlier = &report.candidates[3];
        assert!(outlier.has_inconsistency);
        assert!(outlier.inconsistency_reasons[0].contains("13x13"));
        assert!(!report.candidates[0].has_inconsistency);
        assert_eq!(report.inconsistencies, 1);
    }

    #[test]
    fn flags_bad_and_default_names() {
        let report = analyze(vec![
            candidate("1", "Vector 3", "A", 24.0),
            candidate("2", "arrow--left", "A", 24.0),
            candidate("3", "arrow-right", "A", 24.0),
        ]);
        assert!(report.candidates[0].inconsistency_reasons[0].starts_with("Default layer name"));
        assert!(report.candidates[1].inconsistency_reasons[0].contains("naming conventions"));
        assert!(!report.candidates[2].has_inconsistency);
    }

    #[test]
    fn flags_same_page_and_cross_page_duplicates() {
        let report = analyze(vec![
            candidate("1", "home-icon", "A", 24.0),
            candidate("2", "HomeIcon", "A", 24.0),
            candidate("3", "home_icon2", "B", 24.0),
            candidate("4", "search", "B", 24.0),
        ]);
        let first = &report.candidates[0].inconsistency_reasons;
        assert!(first.iter().any(|r| r.contains("Possible duplicate on page \"A\"")));
        assert!(first.iter().any(|r| r.contains("used by 3 icons")));
        let third = &report.candidates[2].inconsistency_reasons;
        assert!(!third.iter().any(|r| r.contains("Possible duplicate")));
        assert!(third.iter().any(|r| r.contains("used by 3 icons")));
        assert!(!report.candidates[3].has_inconsistency);
    }

    #[test]
    fn pattern_flag_fires_for_same_page_pairs_too() {
        let report = analyze(vec![
            candidate("1", "home-icon", "A", 24.0),
            candidate("2", "HomeIcon", "A", 24.0),
        ]);
        for c in &report.candidates {
            assert_eq!(c.inconsistency_reasons.len(), 2);
            assert!(c.inconsistency_reasons[1].contains("\"homeicon\" is used by 2 icons"));
        }
    }

    #[test]
    fn instances_take_part_in_duplicate_checks() {
        let mut a = candidate("1", "home", "A", 24.0);
        a.status = CandidateStatus::Instance;
        let mut b = candidate("2", "home", "B", 24.0);
        b.status = CandidateStatus::Instance;
        let report = analyze(vec![a, b]);
        assert_eq!(report.inconsistencies, 2);
        assert!(report.candidates[0].inconsistency_reasons[0].contains("used by 2 icons"));
    }
}
