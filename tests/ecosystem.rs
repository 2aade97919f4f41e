// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;

use strategyrc::cmds::render;
use strategyrc::strategy::{StrategyEnv, StrategyKind};
use strategyrc::{validate, AppDescriptor, DuplicateKeys, EnvValue, ErrorKind, Loader};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Vec<AppDescriptor> {
    Loader::new()
        .load_path(&fixture(name))
        .expect("failed to load fixture")
}

#[test]
fn test_load_spot_bot() {
    let apps = load_fixture("ecosystem.config.js");
    assert_eq!(apps.len(), 1);

    let app = &apps[0];
    assert_eq!(app.name, "MyBot");
    assert_eq!(app.script, PathBuf::from("strategy_runner.py"));
    assert_eq!(app.env.len(), 18);
    assert_eq!(app.env.get("DELTA_PRODUCT_ID"), Some(&EnvValue::Integer(16)));
    assert_eq!(app.env.get("DELTA_ACCOUNTS"), Some(&EnvValue::from("delta@account.com")));
    assert_eq!(app.env.get("DIFF_PRICE_PERCENT"), Some(&EnvValue::Integer(0)));
}

#[test]
fn test_reserialized_apps_load_identically() {
    for name in &["ecosystem.config.js", "futures.config.js"] {
        let apps = load_fixture(name);

        let rendered = render(&apps).expect("failed to render");
        let reloaded = strategyrc::load(&rendered).expect("failed to reload");
        assert_eq!(apps, reloaded, "{}", name);
    }
}

#[test]
fn test_module_and_json_forms_match() {
    let text = fs::read_to_string(fixture("ecosystem.config.js")).expect("failed to read");
    let json = text
        .trim()
        .trim_start_matches("module.exports =")
        .trim_end_matches(';');

    assert_eq!(
        strategyrc::load(json).expect("json failed"),
        strategyrc::load(&text).expect("module failed")
    );
}

#[test]
fn test_descriptors_are_independent() {
    let spot = load_fixture("ecosystem.config.js");
    let futures = load_fixture("futures.config.js");
    let (spot, futures) = (&spot[0].env, &futures[0].env);

    assert_eq!(spot.get("DELTA_PRODUCT_SYMBOL"), Some(&EnvValue::from("BTCUSD")));
    assert_eq!(futures.get("DELTA_PRODUCT_SYMBOL"), Some(&EnvValue::from("BTCUSD_28Jun")));

    assert_eq!(spot.get("MIN_LEVEL_SIZE"), Some(&EnvValue::Integer(10000)));
    assert_eq!(spot.get("MAX_LEVEL_SIZE"), Some(&EnvValue::Integer(100000)));
    assert_eq!(futures.get("MIN_LEVEL_SIZE"), Some(&EnvValue::Integer(100)));
    assert_eq!(futures.get("MAX_LEVEL_SIZE"), Some(&EnvValue::Integer(1000)));
}

#[test]
fn test_duplicate_key_keeps_last_value() {
    let apps = load_fixture("futures.config.js");
    assert_eq!(apps[0].env.get("NUM_LEVELS"), Some(&EnvValue::Integer(6)));
}

#[test]
fn test_duplicate_key_rejected_when_strict() {
    let err = Loader::new()
        .duplicate_keys(DuplicateKeys::Reject)
        .load_path(&fixture("futures.config.js"))
        .unwrap_err();

    assert!(err.is_malformed(), "{}", err);
    assert!(err.to_string().contains("NUM_LEVELS"), "{}", err);
}

#[test]
fn test_missing_script_is_malformed() {
    let err = Loader::new()
        .load_path(&fixture("missing_script.json"))
        .unwrap_err();

    assert!(err.is_malformed(), "{}", err);
    assert!(err.to_string().contains("`script`"), "{}", err);
}

#[test]
fn test_nested_env_value() {
    let err = Loader::new()
        .load_path(&fixture("nested_env.json"))
        .unwrap_err();
    assert!(err.is_malformed(), "{}", err);

    let mut app = load_fixture("ecosystem.config.js").remove(0);
    app.env
        .insert("LEVELS", EnvValue::from_json(json!({ "buy": 5, "sell": 6 })));

    let err = validate(&app).unwrap_err();
    assert_eq!(err.field, "env.LEVELS");
}

#[test]
fn test_same_app_name_across_sources() {
    let err = Loader::new()
        .load_paths(&[fixture("ecosystem.config.js"), fixture("futures.config.js")])
        .unwrap_err();

    let validation = err.as_validation().expect("expected a validation error");
    assert_eq!(validation.app, "MyBot");
    assert_eq!(validation.field, "name");
}

#[test]
fn test_relative_cwd_resolves_against_config_dir() {
    let apps = load_fixture("with_cwd.json");

    assert_eq!(apps[0].cwd, Some(fixture("bot")));
    assert_eq!(apps[1].cwd, Some(PathBuf::from("/srv/bot")));
}

#[test]
fn test_unreadable_config_keeps_path() {
    let missing = fixture("does_not_exist.json");
    let err = Loader::new().load_path(&missing).unwrap_err();

    match err.kind() {
        ErrorKind::ReadConfig { path, source } => {
            assert_eq!(path, &missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_strategy_env_of_spot_bot() {
    let app = &load_fixture("ecosystem.config.js")[0];
    let strategy = StrategyEnv::from_descriptor(app).expect("invalid strategy env");

    assert_eq!(strategy.strategy, StrategyKind::Unhedged);
    assert_eq!(strategy.product_id, 16);
    assert_eq!(strategy.delta_accounts, vec!["delta@account.com"]);
    assert_eq!(strategy.balance_position_interval, Some(Duration::from_secs(2)));
    assert_eq!(strategy.volume_bot_min_quantity, Some(10));
    assert_eq!(strategy.volume_bot_max_quantity, Some(100));
    assert!(strategy.run_volume_bot);
    assert_eq!(strategy.log_file, PathBuf::from("log/MyBot-unhedged.log"));
    assert_eq!(
        strategy.dotenv_paths(Path::new("config")),
        vec![PathBuf::from("config/.env.market_maker")]
    );
}

#[test]
fn test_strategy_env_of_futures_bot() {
    let app = &load_fixture("futures.config.js")[0];
    let strategy = StrategyEnv::from_descriptor(app).expect("invalid strategy env");

    assert_eq!(strategy.product_id, 24);
    assert_eq!(strategy.product_symbol, "BTCUSD_28Jun");
    assert_eq!(strategy.num_levels, Some(6));
    assert_eq!(strategy.min_num_levels, Some(3));
    assert_eq!(strategy.diff_price_percent, Decimal::new(5, 2));
    assert_eq!(strategy.buy_price_scaling_factor, Some(Decimal::new(15, 1)));
    assert_eq!(strategy.sell_price_scaling_factor, Some(Decimal::new(75, 2)));
    assert!(!strategy.run_volume_bot);
}
