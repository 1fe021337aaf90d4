use crate::commands::Out;
use crate::model::{Amount, WeeklySummary, TOTAL_STR, UNITS_SOLD_STR, WEEK_STR};
use crate::state::{self, Source};
use crate::{Config, Result};
use anyhow::Context;

/// Loads the configured source once and reports its weekly totals, either as an aligned table or
/// as pretty JSON.
pub async fn summary(config: Config, json: bool) -> Result<Out<Vec<WeeklySummary>>> {
    let source = Source::Path(config.source().to_path_buf());
    let dashboard = state::build(&source, config.units()).await?;
    let weeks = dashboard.summary().to_vec();

    let message = if json {
        serde_json::to_string_pretty(&weeks).context("Unable to serialize the summary")?
    } else {
        table(&weeks)?
    };
    Ok(Out::new(message, weeks))
}

fn table(weeks: &[WeeklySummary]) -> Result<String> {
    let mut lines = vec![format!("{WEEK_STR:<10}  {TOTAL_STR:>14}  {UNITS_SOLD_STR:>10}")];
    for week in weeks {
        lines.push(format!(
            "{:<10}  {:>14.2}  {:>10}",
            week.week().to_string(),
            week.total_amount().value(),
            week.total_units()
        ));
    }
    let total = weeks
        .iter()
        .try_fold(Amount::default(), |sum, w| sum.checked_add(&w.total_amount()))
        .context("The grand total overflows")?;
    let units = weeks
        .iter()
        .try_fold(0u64, |sum, w| sum.checked_add(w.total_units()))
        .context("The total unit count overflows")?;
    lines.push(format!(
        "{:<10}  {:>14.2}  {:>10}",
        "Total",
        total.value(),
        units
    ));
    Ok(lines.join("\n"))
}
