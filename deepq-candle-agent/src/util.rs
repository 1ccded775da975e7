//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, Var};
use candle_nn::VarMap;
use deepq_core::error::DeepQError;
use log::trace;

/// Copies every variable of `src` into the variable of `dest` with the same name.
///
/// Both maps stay locked during the whole copy, so readers of `dest` never
/// observe a partially copied parameter set.
pub fn copy_varmap(dest: &VarMap, src: &VarMap) -> Result<()> {
    if std::ptr::eq(dest.data(), src.data()) {
        return Ok(());
    }
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("poisoned lock of the target parameters"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("poisoned lock of the source parameters"))?;

    if dest.len() != src.len() {
        return Err(DeepQError::IncompatibleNetworks(format!(
            "{} variables in the target, {} in the source",
            dest.len(),
            src.len()
        ))
        .into());
    }

    trace!("Copy {} variables", dest.len());
    for (name, v_dest) in dest.iter() {
        let v_src = src.get(name).ok_or_else(|| {
            DeepQError::IncompatibleNetworks(format!("variable {} is missing in the source", name))
        })?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// The number of scalar parameters in a variable map.
pub fn parameter_count(varmap: &VarMap) -> usize {
    varmap.all_vars().iter().map(|v| v.elem_count()).sum()
}

/// Rescales gradients so that their global L2 norm is at most `max_norm`.
///
/// Returns the norm before rescaling.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f32) -> Result<f32> {
    let mut sum_sq = 0f32;
    for var in vars.iter() {
        if let Some(g) = grads.get(var) {
            sum_sq += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let norm = sum_sq.sqrt();

    if norm > max_norm {
        let scale = (max_norm / (norm + 1e-6)) as f64;
        for var in vars.iter() {
            let g = match grads.get(var) {
                Some(g) => (g * scale)?,
                None => continue,
            };
            grads.insert(var, g);
        }
    }

    Ok(norm)
}
