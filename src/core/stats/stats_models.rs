/// Live numbers for a tracked game, as reported by the games API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStats {
    pub playing: u64,
    pub visits: u64,
}

/// Next step-aligned visit threshold strictly above `visits`.
///
/// `step` must be non-zero; the tracking service validates that before a
/// step ever reaches this function.
pub fn milestone(visits: u64, step: u64) -> u64 {
    (visits / step + 1) * step
}

/// Render a number with `,` thousands separators (`4210` -> `"4,210"`).
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Build the per-tick announcement: header, players line, visits line,
/// milestone line.
pub fn format_stats_message(stats: &GameStats, step: u64) -> String {
    let next = milestone(stats.visits, step);
    format!(
        "🎮 **Game Stats** 🎮\n\
         👥 Players Online: **{}**\n\
         👀 Visits: **{}**\n\
         🎯 Next Milestone: **{} visits**",
        group_digits(stats.playing),
        group_digits(stats.visits),
        group_digits(next),
    )
}
