//! Rendering of operation reports for the terminal.

use std::str::FromStr;

use serde::Serializer;
use stitch_git::GitOid;

use crate::compose::StitchReport;
use crate::partition::{BranchStatus, RipReport};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid format '{s}'. Use: text or json")),
        }
    }
}

impl OutputFormat {
    /// Render a stitch report.
    pub fn stitch(self, report: &StitchReport) -> serde_json::Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(report),
            Self::Text => Ok(stitch_text(report)),
        }
    }

    /// Render a rip report.
    pub fn rip(self, report: &RipReport) -> serde_json::Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(report),
            Self::Text => Ok(rip_text(report)),
        }
    }
}

/// Serialize a [`GitOid`] as its hex form.
pub(crate) fn oid_hex<S: Serializer>(oid: &GitOid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

fn stitch_text(report: &StitchReport) -> String {
    let names: Vec<&str> = report.components.iter().map(|c| c.name.as_str()).collect();
    let commit = report.commit;
    format!(
        "Stitched {} into {commit}\n\
         To check out the new commit, run:\n  git checkout -b mono {commit}\n\
         Or to update your current branch:\n  git reset {commit}\n",
        names.join(" & ")
    )
}

fn rip_text(report: &RipReport) -> String {
    if report.commits == 0 {
        return "No commits to rip since base commit\n".to_owned();
    }
    let lines: String = report
        .branches
        .iter()
        .map(|b| match b.status {
            BranchStatus::Created => format!("  {}\n", b.branch),
            BranchStatus::Unchanged => format!("  {} (unchanged)\n", b.branch),
        })
        .collect();
    format!("Branches created:\n{lines}")
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::heads::HeadMatch;
    use crate::identity::CommitterPolicy;
    use crate::partition::BranchReport;

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse(), Ok(OutputFormat::Json));
        assert_eq!("text".parse(), Ok(OutputFormat::Text));
        assert!("toml".parse::<OutputFormat>().is_err());
    }

    fn branch(name: &str, status: BranchStatus) -> BranchReport {
        BranchReport {
            component: name.to_owned(),
            branch: format!("out-{name}"),
            start: GitOid::ZERO,
            matched: HeadMatch::Exact,
            tip: GitOid::ZERO,
            replayed: 1,
            status,
        }
    }

    #[test]
    fn rip_text_lists_branches_in_order() {
        let report = RipReport {
            base: GitOid::ZERO,
            head: GitOid::ZERO,
            committer: CommitterPolicy::Preserve,
            commits: 2,
            skipped: 0,
            branches: vec![
                branch("alpha", BranchStatus::Created),
                branch("beta", BranchStatus::Unchanged),
            ],
        };
        assert_eq!(
            rip_text(&report),
            "Branches created:\n  out-alpha\n  out-beta (unchanged)\n"
        );
        assert_eq!(
            rip_text(&RipReport {
                commits: 0,
                branches: vec![],
                ..report
            }),
            "No commits to rip since base commit\n"
        );
    }

    #[derive(Serialize)]
    struct Wrapper {
        #[serde(serialize_with = "oid_hex")]
        oid: GitOid,
    }

    #[test]
    fn oid_serializes_as_hex() {
        let v = serde_json::to_value(Wrapper { oid: GitOid::ZERO }).unwrap();
        assert_eq!(v["oid"], "0".repeat(40));
    }
}
