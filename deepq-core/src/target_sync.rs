//! Synchronization of the target network with the online network.
use crate::{error::DeepQError, ValueFunction};
use anyhow::Result;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    action_size: usize,
    state_dim: usize,
    parameter_count: usize,
}

impl Binding {
    fn of<V: ValueFunction>(vf: &V) -> Self {
        Self {
            action_size: vf.action_size(),
            state_dim: vf.state_dim(),
            parameter_count: vf.parameter_count(),
        }
    }
}

/// Keeps the target network a frozen snapshot of the online network.
///
/// A pair of networks must be bound with [`TargetSync::bind`] before the
/// first [`TargetSync::sync`]; binding checks that both networks have the
/// same structure. Each sync overwrites every target parameter.
#[derive(Debug, Default)]
pub struct TargetSync {
    binding: Option<Binding>,
    n_syncs: usize,
}

impl TargetSync {
    /// Creates an unbound synchronizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an online/target pair.
    pub fn bind<V: ValueFunction>(&mut self, online: &V, target: &V) -> Result<()> {
        let b_online = Binding::of(online);
        let b_target = Binding::of(target);
        if b_online != b_target {
            return Err(DeepQError::IncompatibleNetworks(format!(
                "online {:?}, target {:?}",
                b_online, b_target
            ))
            .into());
        }
        debug!("Bound target network: {:?}", b_online);
        self.binding = Some(b_online);
        Ok(())
    }

    /// Returns `true` once a pair has been bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Copies every online parameter into the target network.
    pub fn sync<V: ValueFunction>(&mut self, online: &V, target: &mut V) -> Result<()> {
        let binding = self.binding.ok_or(DeepQError::TargetNotBound)?;
        if Binding::of(online) != binding || Binding::of(target) != binding {
            return Err(DeepQError::IncompatibleNetworks(
                "networks differ from the bound pair".to_string(),
            )
            .into());
        }
        target.copy_parameters_from(online)?;
        self.n_syncs += 1;
        info!("Synchronized target network ({} syncs)", self.n_syncs);
        Ok(())
    }

    /// The number of synchronizations performed.
    pub fn n_syncs(&self) -> usize {
        self.n_syncs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::DummyValueFunction;

    #[test]
    fn test_sync_requires_bind() {
        let online = DummyValueFunction::new(3, 2);
        let mut target = DummyValueFunction::new(3, 2);
        let mut sync = TargetSync::new();

        let err = sync.sync(&online, &mut target).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DeepQError>(),
            Some(&DeepQError::TargetNotBound)
        );
        assert_eq!(sync.n_syncs(), 0);
    }

    #[test]
    fn test_bind_rejects_incompatible_pair() {
        let online = DummyValueFunction::new(3, 2);
        let target = DummyValueFunction::new(4, 2);
        let mut sync = TargetSync::new();

        assert!(sync.bind(&online, &target).is_err());
        assert!(!sync.is_bound());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let online = DummyValueFunction::new(2, 1).with_params(vec![0.5, -1.5]);
        let mut target = DummyValueFunction::new(2, 1);
        let mut sync = TargetSync::new();
        sync.bind(&online, &target).unwrap();

        sync.sync(&online, &mut target).unwrap();
        let after_first = target.params().to_vec();
        sync.sync(&online, &mut target).unwrap();

        assert_eq!(target.params(), &after_first[..]);
        assert_eq!(target.params(), online.params());
        assert_eq!(sync.n_syncs(), 2);
    }
}
