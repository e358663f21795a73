//! Sidebar and tab list parsing.

use super::map::parse_number;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommissionProgress {
    InProgress(f32),
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commission {
    pub name: String,
    pub progress: CommissionProgress,
}

impl Commission {
    pub fn is_done(&self) -> bool {
        self.progress == CommissionProgress::Done
    }
}

/// Reads the block following the `Commissions:` header of the tab list.
///
/// ```text
/// Commissions:
///  Mithril Miner: 45%
///  Goblin Slayer: DONE
/// ```
pub fn commissions(tablist: &[String]) -> Vec<Commission> {
    let start = match tablist.iter().position(|line| line.trim() == "Commissions:") {
        Some(start) => start + 1,
        None => return Vec::new(),
    };
    let mut commissions = Vec::new();
    for line in &tablist[start..] {
        let (name, progress) = match line.trim().split_once(':') {
            Some(parts) => parts,
            None => break,
        };
        let progress = if progress.trim().eq_ignore_ascii_case("DONE") {
            CommissionProgress::Done
        } else {
            match parse_number(progress) {
                Some(value) => CommissionProgress::InProgress(value as f32),
                None => break,
            }
        };
        commissions.push(Commission {
            name: name.trim().to_string(),
            progress,
        });
    }
    commissions
}

/// Area shown on the sidebar line starting with `⏣`.
pub fn current_area(scoreboard: &[String]) -> Option<String> {
    scoreboard
        .iter()
        .map(|line| line.trim())
        .find_map(|line| line.strip_prefix('⏣'))
        .map(|area| area.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn parses_commission_block() {
        let tablist = lines(&["Info", "Commissions:", " Mithril Miner: 45%", " Goblin Slayer: DONE", "", "Skills:"]);
        let parsed = commissions(&tablist);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].progress, CommissionProgress::InProgress(45.0));
        assert!(parsed[1].is_done());
    }

    #[test]
    fn missing_header_yields_nothing() {
        assert!(commissions(&lines(&["Skills:", " Mining 50: 10%"])).is_empty());
    }

    #[test]
    fn reads_area() {
        let scoreboard = lines(&["Winter 3rd", " ⏣ The Forge", "Purse: 1,000"]);
        assert_eq!(current_area(&scoreboard).as_deref(), Some("The Forge"));
        assert_eq!(current_area(&lines(&["Purse: 1"])), None);
    }
}
