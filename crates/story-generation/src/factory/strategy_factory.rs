use crate::context::{GenerationContext, GenerationResult};
use crate::errors::GenerationError;
use crate::strategies::{AdvancedModeStrategy, EasyModeStrategy, TemplateModeStrategy};
use crate::strategy::GenerationStrategy;
use indexmap::IndexMap;
use rand::RngCore;
use std::sync::Arc;
use story_domain::CreationMode;

/// Registro inmutable `CreationMode -> estrategia`.
///
/// Se construye una vez al arrancar y se pasa por referencia a quien tenga
/// que resolver estrategias. `Default` registra los tres modos de la
/// aplicación; `register_strategy` permite sustituir o añadir estrategias
/// (por ejemplo en tests) y la última registrada para un modo gana.
#[derive(Clone)]
pub struct StrategyFactory {
  strategies: IndexMap<CreationMode, Arc<dyn GenerationStrategy>>,
}

impl StrategyFactory {
  /// Fábrica sin estrategias.
  pub fn empty() -> Self {
    Self { strategies: IndexMap::new() }
  }

  /// Devuelve una fábrica con `strategy` registrada para `mode`.
  pub fn register_strategy(mut self, mode: CreationMode, strategy: Arc<dyn GenerationStrategy>) -> Self {
    if strategy.mode() != mode {
      log::warn!("estrategia de modo {} registrada para el modo {}", strategy.mode(), mode);
    }
    self.strategies.insert(mode, strategy);
    self
  }

  /// Resuelve la estrategia del modo.
  pub fn get_strategy(&self, mode: CreationMode) -> Result<Arc<dyn GenerationStrategy>, GenerationError> {
    self.strategies.get(&mode).cloned().ok_or(GenerationError::NoStrategy(mode))
  }

  /// Modos registrados, en orden de registro.
  pub fn supported_modes(&self) -> Vec<CreationMode> {
    self.strategies.keys().copied().collect()
  }

  /// Atajo: resuelve la estrategia del contexto y ejecuta el pipeline.
  pub fn generate(&self, ctx: &GenerationContext, rng: &mut dyn RngCore) -> Result<GenerationResult, GenerationError> {
    self.get_strategy(ctx.mode())?.generate(ctx, rng)
  }
}

impl Default for StrategyFactory {
  fn default() -> Self {
    Self::empty().register_strategy(CreationMode::Easy, Arc::new(EasyModeStrategy))
                 .register_strategy(CreationMode::Template, Arc::new(TemplateModeStrategy))
                 .register_strategy(CreationMode::Advanced, Arc::new(AdvancedModeStrategy))
  }
}
