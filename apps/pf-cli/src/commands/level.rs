// level.rs — `pf level`: which level do these signals demand, and why.

use std::collections::BTreeSet;

use pf_policy::{ComplianceLevel, DataClassification, Framework};

pub fn execute(frameworks: &[String], classification: &str) -> anyhow::Result<()> {
    let enabled = frameworks
        .iter()
        .map(|f| f.parse::<Framework>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    let classification: DataClassification = classification.parse()?;

    print!("{}", render(&enabled, classification));
    Ok(())
}

fn render(enabled: &BTreeSet<Framework>, classification: DataClassification) -> String {
    let level = ComplianceLevel::compute(enabled, classification);
    let mut out = format!("Compliance level: {}\n", level);
    out.push_str(&format!(
        "Session ceiling:  {}h\n",
        level.session_ceiling_hours()
    ));
    out.push_str("Signals:\n");
    out.push_str(&format!(
        "  {:<24} {}\n",
        format!("classification {}", classification),
        ComplianceLevel::required_for(classification)
    ));
    for framework in enabled {
        out.push_str(&format!(
            "  {:<24} {}\n",
            format!("framework {}", framework),
            ComplianceLevel::required_by(*framework)
        ));
    }
    if enabled.is_empty() {
        out.push_str("  no framework enabled: no rules will be emitted at any level\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_signal_wins() {
        let enabled = BTreeSet::from([Framework::Iso27001, Framework::Hipaa]);
        let out = render(&enabled, DataClassification::Internal);
        assert!(out.starts_with("Compliance level: maximum\n"));
        assert!(out.contains("Session ceiling:  4h"));
        assert!(out.contains("framework hipaa"));
    }

    #[test]
    fn classification_only_is_flagged() {
        let out = render(&BTreeSet::new(), DataClassification::Restricted);
        assert!(out.starts_with("Compliance level: maximum\n"));
        assert!(out.contains("no framework enabled"));
    }
}
