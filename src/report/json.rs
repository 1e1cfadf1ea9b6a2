use crate::report::ScoreSummary;

pub fn to_json(summary: &ScoreSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::GroupStats;

    #[test]
    fn json_summary_contains_group_counts() {
        let summary = ScoreSummary {
            groups: vec![GroupStats {
                group: "reference".to_string(),
                count: 3,
                mean: Some(80.0),
                median: Some(79.5),
                p75: None,
                p90: None,
            }],
        };

        let rendered = to_json(&summary).expect("json should serialize");
        assert!(rendered.contains("\"group\": \"reference\""));
        assert!(rendered.contains("\"count\": 3"));
        assert!(rendered.contains("\"p75\": null"));
    }
}
