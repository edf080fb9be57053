//! Rendu de la ligne de progression.
//!
//! Une seule ligne, réécrite en place par le binaire à chaque poll. Ce
//! module ne fait que formater; l'affichage (`\r`, padding, flush) reste
//! dans `main`.

use pmocastcontrol::PositionSnapshot;
use pmocastcontrol::time_utils::format_clock;

/// Largeur de la barre, en caractères, entre les crochets.
const BAR_WIDTH: usize = 24;

/// Formats the status line for one playback snapshot.
///
/// With a known duration:
/// `[========>               ] 1:23/3:45 (36%) (Enter = stop)`
///
/// With an unknown duration (live stream, NOT_IMPLEMENTED):
/// `[?                       ] 1:23/-- (Enter = stop)`
///
/// The bar is always exactly [`BAR_WIDTH`] characters wide; the
/// percentage is clamped to 100 and omitted when the duration is
/// unknown.
pub fn format_status_line(snapshot: &PositionSnapshot) -> String {
    let elapsed = snapshot.elapsed.as_secs();
    match snapshot.total.map(|total| total.as_secs()) {
        Some(total) if total > 0 => {
            let filled = ((elapsed * BAR_WIDTH as u64) / total).min(BAR_WIDTH as u64) as usize;
            let pct = ((elapsed * 100) / total).min(100);
            format!(
                "[{}] {}/{} ({}%) (Enter = stop)",
                render_bar(filled),
                format_clock(elapsed),
                format_clock(total),
                pct
            )
        }
        _ => format!(
            "[{:<width$}] {}/-- (Enter = stop)",
            '?',
            format_clock(elapsed),
            width = BAR_WIDTH
        ),
    }
}

/// `=` jusqu'à `filled`, tête `>`, espaces jusqu'à [`BAR_WIDTH`].
fn render_bar(filled: usize) -> String {
    if filled >= BAR_WIDTH {
        "=".repeat(BAR_WIDTH)
    } else {
        format!(
            "{}>{}",
            "=".repeat(filled),
            " ".repeat(BAR_WIDTH - filled - 1)
        )
    }
}
