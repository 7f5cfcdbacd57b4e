use serde::Serialize;
use tagdraw::{tags_in, Award, PrizeTier};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WinnerRow {
    /// 1-based.
    pub rank: usize,
    pub author: String,
    pub text: String,
    pub hashtags: Vec<String>,
    pub comment_id: String,
    pub prize: Option<PrizeTier>,
}

pub fn winner_rows(awards: Vec<Award>) -> Vec<WinnerRow> {
    awards
        .into_iter()
        .enumerate()
        .map(|(i, award)| WinnerRow {
            rank: i + 1,
            hashtags: tags_in(&award.entry.text).iter().map(ToString::to_string).collect(),
            author: award.entry.author,
            text: award.entry.text,
            comment_id: award.entry.comment_id,
            prize: award.tier,
        })
        .collect()
}

/// Human readable listing for the `pick` command.
pub fn render_text(rows: &[WinnerRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!("#{} {}\n", row.rank, row.author));
        out.push_str(&format!("  comment:  {}\n", row.text));
        out.push_str(&format!("  hashtags: {}\n", row.hashtags.join(", ")));
        let prize = match &row.prize {
            Some(tier) if tier.value > 0 => format!("{} ({}), NT$ {}", tier.name, tier.detail, tier.value),
            Some(tier) => format!("{} ({})", tier.name, tier.detail),
            None => "consolation".to_string(),
        };
        out.push_str(&format!("  prize:    {prize}\n"));
    }
    out
}
