// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The environment a strategy runner reads at start-up
//!
//! Each variable may be declared as a number or as a numeric string, the child process
//! only ever sees the string. Parsing here checks that what the runner will parse is
//! representable as the type it expects.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::descriptor::{AppDescriptor, EnvMap};
use crate::error::ValidationError;

pub const DOTENVS: &str = "DOTENVS";
pub const BOT: &str = "BOT";
pub const DELTA_ACCOUNTS: &str = "DELTA_ACCOUNTS";
pub const STRATEGY: &str = "STRATEGY";
pub const DELTA_PRODUCT_ID: &str = "DELTA_PRODUCT_ID";
pub const DELTA_PRODUCT_SYMBOL: &str = "DELTA_PRODUCT_SYMBOL";
pub const MAX_LEVERAGE: &str = "MAX_LEVERAGE";
pub const IMPACT_SIZE: &str = "IMPACT_SIZE";
pub const LOOP_INTERVAL: &str = "LOOP_INTERVAL";
pub const BALANCE_POSITION_INTERVAL: &str = "BALANCE_POSITION_INTERVAL";
pub const VOLUME_BOT_MIN_QUANTITY: &str = "VOLUME_BOT_MIN_QUANTITY";
pub const VOLUME_BOT_MAX_QUANTITY: &str = "VOLUME_BOT_MAX_QUANTITY";
pub const RUN_VOLUME_BOT: &str = "RUN_VOLUME_BOT";
pub const DIFF_PRICE_PERCENT: &str = "DIFF_PRICE_PERCENT";
pub const DIFF_SIZE_PERCENT: &str = "DIFF_SIZE_PERCENT";
pub const NUM_LEVELS: &str = "NUM_LEVELS";
pub const MIN_NUM_LEVELS: &str = "MIN_NUM_LEVELS";
pub const BUY_PRICE_SCALING_FACTOR: &str = "BUY_PRICE_SCALING_FACTOR";
pub const SELL_PRICE_SCALING_FACTOR: &str = "SELL_PRICE_SCALING_FACTOR";
pub const LOG_FILE: &str = "LOG_FILE";
pub const MIN_LEVEL_SIZE: &str = "MIN_LEVEL_SIZE";
pub const MAX_LEVEL_SIZE: &str = "MAX_LEVEL_SIZE";
pub const AUTO_TOPUP_THRESHOLD: &str = "AUTO_TOPUP_THRESHOLD";

/// Strategies the runner knows how to start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Unhedged,
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unhedged" => Ok(StrategyKind::Unhedged),
            other => Err(format!("unknown strategy {:?}, expected one of [unhedged]", other)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Unhedged => f.write_str("unhedged"),
        }
    }
}

/// Typed view over one app's strategy variables
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyEnv {
    pub dotenvs: Vec<String>,
    pub bot: String,
    pub delta_accounts: Vec<String>,
    pub strategy: StrategyKind,
    pub product_id: u64,
    pub product_symbol: String,
    pub max_leverage: u32,
    pub impact_size: u64,
    pub loop_interval: Duration,
    pub balance_position_interval: Option<Duration>,
    pub volume_bot_min_quantity: Option<u64>,
    pub volume_bot_max_quantity: Option<u64>,
    pub run_volume_bot: bool,
    pub diff_price_percent: Decimal,
    pub diff_size_percent: Option<Decimal>,
    pub num_levels: Option<u32>,
    pub min_num_levels: Option<u32>,
    pub buy_price_scaling_factor: Option<Decimal>,
    pub sell_price_scaling_factor: Option<Decimal>,
    pub log_file: PathBuf,
    pub min_level_size: u64,
    pub max_level_size: u64,
    pub auto_topup_threshold: u64,
}

impl StrategyEnv {
    pub fn from_descriptor(app: &AppDescriptor) -> Result<Self, ValidationError> {
        Self::from_env(&app.name, &app.env)
    }

    pub fn from_env(app: &str, env: &EnvMap) -> Result<Self, ValidationError> {
        let vars = Vars { app, env };

        let strategy_env = StrategyEnv {
            dotenvs: vars.list(DOTENVS)?,
            bot: vars.string(BOT)?,
            delta_accounts: vars.list(DELTA_ACCOUNTS)?,
            strategy: vars.required(STRATEGY)?,
            product_id: vars.required(DELTA_PRODUCT_ID)?,
            product_symbol: vars.string(DELTA_PRODUCT_SYMBOL)?,
            max_leverage: vars.required(MAX_LEVERAGE)?,
            impact_size: vars.required(IMPACT_SIZE)?,
            loop_interval: Duration::from_secs(vars.required(LOOP_INTERVAL)?),
            balance_position_interval: vars
                .optional(BALANCE_POSITION_INTERVAL)?
                .map(Duration::from_secs),
            volume_bot_min_quantity: vars.optional(VOLUME_BOT_MIN_QUANTITY)?,
            volume_bot_max_quantity: vars.optional(VOLUME_BOT_MAX_QUANTITY)?,
            run_volume_bot: vars.flag(RUN_VOLUME_BOT)?,
            diff_price_percent: vars.required(DIFF_PRICE_PERCENT)?,
            diff_size_percent: vars.optional(DIFF_SIZE_PERCENT)?,
            num_levels: vars.optional(NUM_LEVELS)?,
            min_num_levels: vars.optional(MIN_NUM_LEVELS)?,
            buy_price_scaling_factor: vars.optional(BUY_PRICE_SCALING_FACTOR)?,
            sell_price_scaling_factor: vars.optional(SELL_PRICE_SCALING_FACTOR)?,
            log_file: PathBuf::from(vars.string(LOG_FILE)?),
            min_level_size: vars.required(MIN_LEVEL_SIZE)?,
            max_level_size: vars.required(MAX_LEVEL_SIZE)?,
            auto_topup_threshold: vars.required(AUTO_TOPUP_THRESHOLD)?,
        };

        strategy_env.check_bounds(app)?;
        Ok(strategy_env)
    }

    /// The runner draws sizes and level counts between these bounds
    fn check_bounds(&self, app: &str) -> Result<(), ValidationError> {
        if self.min_level_size > self.max_level_size {
            return Err(ValidationError::new(
                app,
                MIN_LEVEL_SIZE,
                format!(
                    "{} is greater than {} ({})",
                    self.min_level_size, MAX_LEVEL_SIZE, self.max_level_size
                ),
            ));
        }

        if let (Some(min), Some(max)) = (self.volume_bot_min_quantity, self.volume_bot_max_quantity) {
            if min > max {
                return Err(ValidationError::new(
                    app,
                    VOLUME_BOT_MIN_QUANTITY,
                    format!("{} is greater than {} ({})", min, VOLUME_BOT_MAX_QUANTITY, max),
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_num_levels, self.num_levels) {
            if min > max {
                return Err(ValidationError::new(
                    app,
                    MIN_NUM_LEVELS,
                    format!("{} is greater than {} ({})", min, NUM_LEVELS, max),
                ));
            }
        }

        Ok(())
    }

    /// The dotenv files the runner loads, one per profile in `DOTENVS`
    pub fn dotenv_paths(&self, config_dir: &Path) -> Vec<PathBuf> {
        self.dotenvs
            .iter()
            .map(|profile| config_dir.join(format!(".env.{}", profile)))
            .collect()
    }
}

struct Vars<'a> {
    app: &'a str,
    env: &'a EnvMap,
}

impl<'a> Vars<'a> {
    fn error(&self, key: &str, reason: impl Into<String>) -> ValidationError {
        ValidationError::new(self.app, key, reason)
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.env.get(key).map(|value| value.to_string())
    }

    fn optional<T>(&self, key: &str) -> Result<Option<T>, ValidationError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.raw(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.error(key, format!("could not parse {:?}: {}", raw, e))),
        }
    }

    fn required<T>(&self, key: &str) -> Result<T, ValidationError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key)?
            .ok_or_else(|| self.error(key, "required variable is not set"))
    }

    fn string(&self, key: &str) -> Result<String, ValidationError> {
        let value = self
            .raw(key)
            .ok_or_else(|| self.error(key, "required variable is not set"))?;

        if value.trim().is_empty() {
            return Err(self.error(key, "must not be empty"));
        }

        Ok(value)
    }

    /// Comma separated, at least one entry
    fn list(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        let list = self
            .string(key)?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if list.is_empty() {
            return Err(self.error(key, "expected a comma separated list"));
        }

        Ok(list)
    }

    /// `0` or `1`, unset is off
    fn flag(&self, key: &str) -> Result<bool, ValidationError> {
        match self.raw(key).as_deref().map(str::trim) {
            None | Some("0") => Ok(false),
            Some("1") => Ok(true),
            Some(other) => Err(self.error(key, format!("expected 0 or 1, found {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EnvValue;

    fn env() -> EnvMap {
        vec![
            (DOTENVS, EnvValue::from("market_maker")),
            (BOT, EnvValue::from("MyBot")),
            (DELTA_ACCOUNTS, EnvValue::from("delta@account.com")),
            (STRATEGY, EnvValue::from("unhedged")),
            (DELTA_PRODUCT_ID, EnvValue::from(16i64)),
            (DELTA_PRODUCT_SYMBOL, EnvValue::from("BTCUSD")),
            (MAX_LEVERAGE, EnvValue::from(1i64)),
            (IMPACT_SIZE, EnvValue::from(1000i64)),
            (LOOP_INTERVAL, EnvValue::from(3i64)),
            (DIFF_PRICE_PERCENT, EnvValue::from(0i64)),
            (LOG_FILE, EnvValue::from("log/MyBot-unhedged.log")),
            (MIN_LEVEL_SIZE, EnvValue::from(10000i64)),
            (MAX_LEVEL_SIZE, EnvValue::from(100000i64)),
            (AUTO_TOPUP_THRESHOLD, EnvValue::from(10i64)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_minimal_env() {
        let strategy = StrategyEnv::from_env("MyBot", &env()).expect("invalid env");

        assert_eq!(strategy.strategy, StrategyKind::Unhedged);
        assert_eq!(strategy.product_id, 16);
        assert_eq!(strategy.loop_interval, Duration::from_secs(3));
        assert_eq!(strategy.diff_price_percent, Decimal::ZERO);
        assert!(!strategy.run_volume_bot);
        assert_eq!(strategy.num_levels, None);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut env = env();
        env.insert(DELTA_PRODUCT_ID, "24");
        env.insert(BUY_PRICE_SCALING_FACTOR, "0.25");
        env.insert(RUN_VOLUME_BOT, 1i64);

        let strategy = StrategyEnv::from_env("MyBot", &env).expect("invalid env");
        assert_eq!(strategy.product_id, 24);
        assert_eq!(strategy.buy_price_scaling_factor, Some(Decimal::new(25, 2)));
        assert!(strategy.run_volume_bot);
    }

    #[test]
    fn test_float_where_integer_expected() {
        let mut env = env();
        env.insert(DELTA_PRODUCT_ID, 16.5f64);

        let err = StrategyEnv::from_env("MyBot", &env).unwrap_err();
        assert_eq!(err.field, DELTA_PRODUCT_ID);
        assert_eq!(err.app, "MyBot");
    }

    #[test]
    fn test_missing_required() {
        let env: EnvMap = env()
            .iter()
            .filter(|(key, _)| key.as_str() != LOG_FILE)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let err = StrategyEnv::from_env("MyBot", &env).unwrap_err();
        assert_eq!(err.field, LOG_FILE);
        assert!(err.reason.contains("not set"));
    }

    #[test]
    fn test_unknown_strategy() {
        let mut env = env();
        env.insert(STRATEGY, "hedged");

        assert_eq!(StrategyEnv::from_env("MyBot", &env).unwrap_err().field, STRATEGY);
    }

    #[test]
    fn test_strategy_is_case_insensitive() {
        assert_eq!("Unhedged".parse::<StrategyKind>(), Ok(StrategyKind::Unhedged));
    }

    #[test]
    fn test_level_size_bounds() {
        let mut env = env();
        env.insert(MIN_LEVEL_SIZE, 100001i64);

        assert_eq!(StrategyEnv::from_env("MyBot", &env).unwrap_err().field, MIN_LEVEL_SIZE);
    }

    #[test]
    fn test_num_levels_bounds() {
        let mut env = env();
        env.insert(NUM_LEVELS, 5i64);
        env.insert(MIN_NUM_LEVELS, 6i64);

        assert_eq!(StrategyEnv::from_env("MyBot", &env).unwrap_err().field, MIN_NUM_LEVELS);
    }

    #[test]
    fn test_bad_flag() {
        let mut env = env();
        env.insert(RUN_VOLUME_BOT, "yes");

        assert_eq!(StrategyEnv::from_env("MyBot", &env).unwrap_err().field, RUN_VOLUME_BOT);
    }

    #[test]
    fn test_dotenv_paths() {
        let mut env = env();
        env.insert(DOTENVS, "market_maker, alerts");

        let strategy = StrategyEnv::from_env("MyBot", &env).expect("invalid env");
        assert_eq!(
            strategy.dotenv_paths(Path::new("config")),
            vec![
                PathBuf::from("config/.env.market_maker"),
                PathBuf::from("config/.env.alerts"),
            ]
        );
    }
}
