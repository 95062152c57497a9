//! Static HTML report generation from an aggregated reward history.

use manaplex_rewards::ParsedPlayerRewardHistory;
use std::io::Write;
use std::path::Path;

/// Render a static HTML report to `out_path`. Embeds the full history JSON
/// so the page is self-contained.
pub fn render_report(
    history: &ParsedPlayerRewardHistory,
    out_path: impl AsRef<Path>,
) -> Result<(), ReportError> {
    let html = build_html(history)?;
    let mut f = std::fs::File::create(out_path.as_ref()).map_err(ReportError::Io)?;
    f.write_all(html.as_bytes()).map_err(ReportError::Io)?;
    Ok(())
}

/// Build the HTML string (for testing or in-memory use).
pub fn build_html(history: &ParsedPlayerRewardHistory) -> Result<String, ReportError> {
    let json_embed = escape_html(&serde_json::to_string(history).map_err(ReportError::Json)?);
    let player = escape_html(&history.player);
    let s = &history.aggregation;

    let window = history
        .date_range
        .map(|r| format!("{} → {}", r.start, r.end))
        .unwrap_or_else(|| "full history".to_string());
    let season = history
        .season_id
        .map(|id| format!("season {id}"))
        .unwrap_or_else(|| "custom window".to_string());
    let fallback_count = history
        .all_entries
        .iter()
        .filter(|e| e.parsing_error)
        .count();

    let card_rows: String = s
        .total_cards
        .iter()
        .map(|(card_id, t)| {
            format!(
                "<tr><td>{card_id}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                t.edition, t.quantity, t.gold_quantity, t.regular_quantity
            )
        })
        .collect();
    let pack_rows: String = s
        .total_packs
        .iter()
        .map(|(edition, count)| format!("<tr><td>{edition}</td><td>{count}</td></tr>"))
        .collect();
    let potion_rows: String = s
        .total_potions
        .iter()
        .map(|(kind, count)| format!("<tr><td>{}</td><td>{count}</td></tr>", escape_html(kind)))
        .collect();
    let scroll_rows: String = s
        .total_scrolls
        .iter()
        .map(|(tier, count)| format!("<tr><td>{}</td><td>{count}</td></tr>", tier.as_key()))
        .collect();
    let quest_rows: String = s
        .quest_type_breakdown
        .iter()
        .map(|(name, count)| format!("<tr><td>{}</td><td>{count}</td></tr>", escape_html(name)))
        .collect();
    let league_rows: String = s
        .league_advancements
        .iter()
        .map(|(format, tiers)| {
            // Display ascending; aggregation keeps insertion order.
            let mut sorted = tiers.clone();
            sorted.sort_unstable();
            let tiers_str = sorted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("<tr><td>{}</td><td>{tiers_str}</td></tr>", format.as_key())
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Reward History – {player}</title>
<style>
:root {{ font-family: system-ui, sans-serif; background: #0f1419; color: #e6edf3; }}
body {{ max-width: 760px; margin: 0 auto; padding: 1.5rem; }}
h1 {{ font-size: 1.4rem; margin-bottom: 0.5rem; }}
h2 {{ font-size: 1.1rem; margin-top: 1.5rem; color: #8b949e; }}
.mono {{ font-family: ui-monospace, monospace; font-size: 0.9em; word-break: break-all; }}
.card {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; margin: 0.5rem 0; }}
.grid {{ display: grid; grid-template-columns: auto 1fr; gap: 0.25rem 1rem; }}
.label {{ color: #8b949e; }}
table {{ width: 100%; border-collapse: collapse; }}
td, th {{ text-align: left; padding: 0.2rem 0.5rem; border-bottom: 1px solid #30363d; }}
.footer {{ margin-top: 2rem; font-size: 0.85rem; color: #8b949e; }}
</style>
</head>
<body>
<h1>Reward History Report</h1>
<p class="mono">{player} · {season} · {window}</p>

<h2>Totals</h2>
<div class="card">
  <div class="grid">
    <span class="label">Entries</span><span class="mono">{total_entries}</span>
    <span class="label">Unparsed entries (raw fallback)</span><span class="mono">{fallback_count}</span>
    <span class="label">Merits</span><span class="mono">{merits}</span>
    <span class="label">Merit purchase bundles</span><span class="mono">{merit_bundles}</span>
    <span class="label">Energy</span><span class="mono">{energy}</span>
    <span class="label">Ranked entries</span><span class="mono">{ranked}</span>
    <span class="label">Frontier entries</span><span class="mono">{frontier}</span>
    <span class="label">Draws (minor / major / ultimate)</span><span class="mono">{draws_minor} / {draws_major} / {draws_ultimate}</span>
    <span class="label">Season glint</span><span class="mono">{glint}</span>
    <span class="label">Season affiliate glint</span><span class="mono">{affiliate_glint}</span>
  </div>
</div>

<h2>Cards</h2>
<div class="card">
  <table>
    <tr><th>Card</th><th>Edition</th><th>Qty</th><th>Gold</th><th>Regular</th></tr>
    {card_rows}
  </table>
</div>

<h2>Packs</h2>
<div class="card"><table><tr><th>Edition</th><th>Count</th></tr>{pack_rows}</table></div>

<h2>Potions</h2>
<div class="card"><table><tr><th>Type</th><th>Count</th></tr>{potion_rows}</table></div>

<h2>Scrolls</h2>
<div class="card"><table><tr><th>Tier</th><th>Count</th></tr>{scroll_rows}</table></div>

<h2>Daily quests</h2>
<div class="card"><table><tr><th>Quest</th><th>Claims</th></tr>{quest_rows}</table></div>

<h2>League advancements</h2>
<div class="card"><table><tr><th>Format</th><th>Tiers</th></tr>{league_rows}</table></div>

<h2>History (embedded)</h2>
<div class="card">
  <p class="footer">The full parsed history is embedded below. Do not edit.</p>
  <script type="application/json" id="reward-history">{json_embed}</script>
</div>

<div class="footer">
  <p>Generated by manaplex-rewards. Read-only tool; no signing.</p>
</div>
</body>
</html>"#,
        player = player,
        season = escape_html(&season),
        window = escape_html(&window),
        total_entries = history.total_entries,
        fallback_count = fallback_count,
        merits = s.total_merits,
        merit_bundles = s.merit_purchase_count,
        energy = s.total_energy,
        ranked = s.total_ranked_entries,
        frontier = s.total_frontier_entries,
        draws_minor = s.total_draws.minor,
        draws_major = s.total_draws.major,
        draws_ultimate = s.total_draws.ultimate,
        glint = s.season_glint,
        affiliate_glint = s.season_affiliate_glint,
        card_rows = card_rows,
        pack_rows = pack_rows,
        potion_rows = potion_rows,
        scroll_rows = scroll_rows,
        quest_rows = quest_rows,
        league_rows = league_rows,
        json_embed = json_embed,
    );
    Ok(html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "io: {}", e),
            ReportError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for ReportError {}
