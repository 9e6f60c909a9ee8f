pub mod strategy_factory;

pub use strategy_factory::StrategyFactory;
