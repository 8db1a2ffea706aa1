//! Transaction intelligence commands
//!
//! Classification, learning, anomaly checks, forecasts, recommendations and
//! learned-history stats, all scoped to the `--user` given on the command line.

use anyhow::{bail, Result};
use fina_core::intelligence::format_brl;
use fina_core::{
    db::Database, AnomalyCheck, AnomalyOptions, ClassificationSource, InsightPhraser,
    IntelligenceEngine, OllamaPhraser,
};
use fina_server::MAX_FORECAST_MONTHS;

use super::{parse_amount, parse_month, resolve_category};

pub fn cmd_classify(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    description: &str,
    amount: &str,
    category: Option<&str>,
    simple: bool,
    json: bool,
) -> Result<()> {
    let amount = parse_amount(amount)?;

    let suggestions = if simple {
        vec![engine.classify_simple(description, amount, category)]
    } else {
        engine.classify(user_id, description, amount, category)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    println!();
    println!("🏷️  Suggestions for \"{}\" ({})", description, format_brl(amount));
    println!("   ─────────────────────────────────────────");
    for (rank, suggestion) in suggestions.iter().enumerate() {
        println!(
            "   {}. {:<24} {:>3}%  {} ({})",
            rank + 1,
            suggestion.category_name,
            suggestion.confidence,
            suggestion.category_type,
            suggestion.source.as_str()
        );
    }

    Ok(())
}

pub fn cmd_learn(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    description: &str,
    amount: &str,
    category: &str,
    confirmed: bool,
) -> Result<()> {
    if description.trim().is_empty() {
        bail!("Description must not be empty");
    }
    let amount = parse_amount(amount)?;
    let category = resolve_category(engine.store(), user_id, category)?;
    let source = if confirmed {
        ClassificationSource::Confirmed
    } else {
        ClassificationSource::Manual
    };

    engine.learn(user_id, description, amount, category.id, source);

    println!(
        "🧠 Learned: \"{}\" → {} ({})",
        description.trim(),
        category.name,
        source
    );
    Ok(())
}

/// One-line verdict for an anomaly check
pub fn anomaly_verdict(check: &AnomalyCheck, options: &AnomalyOptions) -> String {
    if check.samples < options.min_samples.max(1) {
        format!(
            "Not enough history ({} of {} observations needed) - no signal",
            check.samples, options.min_samples
        )
    } else if check.is_anomalous {
        format!(
            "⚠️  Unusually high: more than {}x the average of {}",
            options.threshold,
            format_brl(check.average.round() as i64)
        )
    } else {
        format!(
            "✅ Within the usual range (average {})",
            format_brl(check.average.round() as i64)
        )
    }
}

pub fn cmd_anomaly(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    category: &str,
    amount: &str,
    month: Option<&str>,
) -> Result<()> {
    let amount = parse_amount(amount)?;
    let period = parse_month(month)?;
    let category = resolve_category(engine.store(), user_id, category)?;

    let check = engine.detect_anomaly(
        user_id,
        category.id,
        amount,
        period.month(),
        period.year(),
        None,
    );

    println!();
    println!("🔍 {} in {}: {}", category.name, period, format_brl(amount));
    println!("   {}", anomaly_verdict(&check, &engine.config().anomaly));
    if check.skipped > 0 {
        println!("   ({} entries skipped: item no longer exists)", check.skipped);
    }

    Ok(())
}

pub fn cmd_forecast(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    months: u32,
    json: bool,
) -> Result<()> {
    if months == 0 || months > MAX_FORECAST_MONTHS {
        bail!("--months must be between 1 and {}", MAX_FORECAST_MONTHS);
    }

    let points = engine.forecast_cash_flow(user_id, months);

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    if points.is_empty() {
        println!("No recorded actuals in the last {} months - nothing to forecast.", months);
        return Ok(());
    }

    println!();
    println!("📈 Cash-flow forecast");
    println!("   ─────────────────────────────────────────");
    for point in &points {
        let marker = if point.predicted_balance < 0 { "🔻" } else { "  " };
        println!(
            "   {:02}/{}  {:>16} {}",
            point.month,
            point.year,
            format_brl(point.predicted_balance),
            marker
        );
    }

    Ok(())
}

pub async fn cmd_recommend(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    month: Option<&str>,
    phrase: bool,
) -> Result<()> {
    let phraser = if phrase {
        let phraser = OllamaPhraser::from_env();
        if phraser.is_none() {
            println!("   💡 Tip: Set OLLAMA_HOST to phrase recommendations with a local model");
        }
        phraser
    } else {
        None
    };

    print_recommendations(
        engine,
        user_id,
        month,
        phraser.as_ref().map(|p| p as &dyn InsightPhraser),
    )
    .await
}

/// Recommendations for a month, plus the narrative when a phraser is given
pub async fn print_recommendations(
    engine: &IntelligenceEngine<Database>,
    user_id: i64,
    month: Option<&str>,
    phraser: Option<&dyn InsightPhraser>,
) -> Result<()> {
    let period = parse_month(month)?;
    let report = engine
        .generate_insights_from(user_id, period, phraser)
        .await;

    println!();
    println!("💡 Recommendations for {}", period);
    println!("   ─────────────────────────────────────────");
    if report.recommendations.is_empty() {
        println!("   ✅ Nothing to flag this month.");
        return Ok(());
    }
    for recommendation in &report.recommendations {
        println!("   • {}", recommendation);
    }

    if let Some(narrative) = &report.narrative {
        println!();
        println!("🤖 {}", narrative);
    } else if phraser.is_some() {
        println!();
        println!("   ⚠️  Could not phrase the recommendations (see logs)");
    }

    Ok(())
}

pub fn cmd_stats(engine: &IntelligenceEngine<Database>, user_id: i64, json: bool) -> Result<()> {
    let stats = engine.classification_stats(user_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("🧠 Learned classifications");
    println!("   ─────────────────────────────────────────");
    println!("   Total:            {}", stats.total_classifications);
    println!(
        "   High confidence:  {} (≥ {}%)",
        stats.high_confidence_count,
        engine.config().stats.high_confidence_threshold
    );

    if !stats.top_categories.is_empty() {
        println!();
        println!("   Top categories:");
        for top in &stats.top_categories {
            println!("   • {:<24} {} confirmations", top.name, top.confirmations);
        }
    }

    Ok(())
}
