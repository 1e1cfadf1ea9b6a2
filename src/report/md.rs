use crate::report::ScoreSummary;

fn cell(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn to_markdown(summary: &ScoreSummary) -> String {
    let mut output = String::new();
    output.push_str("# Health Score Summary\n\n");
    output.push_str("| group | count | mean | median | p75 | p90 |\n");
    output.push_str("|---|---:|---:|---:|---:|---:|\n");
    for group in &summary.groups {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            group.group,
            group.count,
            cell(group.mean),
            cell(group.median),
            cell(group.p75),
            cell(group.p90)
        ));
    }
    output
}
