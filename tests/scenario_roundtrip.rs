//! End-to-end: bounds written to the store, bands computed, results read back.

use fxcalc::db::Database;
use fxcalc::scenario::BoundColumn;
use fxcalc::{Precision, RateAdjustmentMode, ScenarioConfig, ScenarioRunner, TradeDirection, Variable};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn seeded_store() -> Database {
    let db = Database::in_memory().await.unwrap();
    let bounds = [
        (Variable::TradeProfit, dec!(-88), dec!(-88)),
        (Variable::TradeAmount, dec!(10000), dec!(10000)),
        (Variable::OpeningValue, dec!(17.6967), dec!(17.6967)),
        (Variable::ClosingValue, dec!(17.7055), dec!(17.7055)),
    ];
    for (variable, min, max) in bounds {
        db.update_bound(variable, BoundColumn::Minimum, min).await.unwrap();
        db.update_bound(variable, BoundColumn::Maximum, max).await.unwrap();
    }
    db
}

fn reference_config() -> ScenarioConfig {
    ScenarioConfig {
        direction: TradeDirection::Sell,
        adjustment: RateAdjustmentMode::ExecutionBased,
        spread: dec!(0.01),
        rate_bk: dec!(1.0),
        rate_kn: dec!(17.7055),
        precision: Precision::default(),
    }
}

#[tokio::test]
async fn test_reference_scenario_through_store() {
    let db = seeded_store().await;
    let runner = ScenarioRunner::new(reference_config()).unwrap();

    let results = runner.run(&db.load_bounds().await.unwrap());
    db.store_results(&results).await.unwrap();

    let rows = db.rows().await.unwrap();
    let row = |name: &str| rows.iter().find(|r| r.variable == name).unwrap().clone();

    let profit = row("tradeprofit");
    assert!((profit.returnmin - dec!(-88)).abs() <= dec!(0.01));
    assert_eq!(profit.returnmin, profit.returnmax);

    assert_eq!(row("profitfactor").returnmin, dec!(-0.0004970207));
    assert!((row("tradeamount").returnmax - dec!(10000)).abs() <= dec!(0.01));
    assert!((row("openingvalue").returnmin - dec!(17.6967)).abs() <= dec!(0.01));
    assert!((row("closingvalue").returnmax - dec!(17.7055)).abs() <= dec!(0.01));
}

#[tokio::test]
async fn test_reset_inputs_zeroes_next_run() {
    let db = seeded_store().await;
    let runner = ScenarioRunner::new(reference_config()).unwrap();

    db.reset_inputs().await.unwrap();
    let results = runner.run(&db.load_bounds().await.unwrap());

    for (_, band) in results.iter() {
        assert_eq!(band.min, Decimal::ZERO);
        assert_eq!(band.max, Decimal::ZERO);
    }
}
