//! Parameter extraction by dotted path.
//!
//! `meta.params` declares which configuration leaves a remote caller
//! may tune, as dotted paths like `"layers.conductivity"`. Resolution
//! is a structural walk over the serialized configuration: split on
//! `.`, follow mapping keys one at a time. A path that does not land
//! on a numeric leaf is a configuration error; no partial result is
//! ever returned.

use serde_json::Value;

use crate::config::Config;
use crate::error::ModelError;

/// Resolve every declared parameter path.
///
/// Returns the parameter values in declaration order together with
/// their element counts. A numeric scalar leaf counts as size 1.
pub fn extract_params(config: &Config) -> Result<(Vec<Vec<f64>>, Vec<usize>), ModelError> {
    let root = to_value(config)?;
    let mut params = Vec::with_capacity(config.meta.params.len());
    let mut sizes = Vec::with_capacity(config.meta.params.len());
    for path in &config.meta.params {
        let leaf = resolve(&root, path)?;
        let values = numeric_leaf(leaf, path)?;
        sizes.push(values.len());
        params.push(values);
    }
    Ok((params, sizes))
}

/// Element counts of the declared parameters, in declaration order.
pub fn param_sizes(config: &Config) -> Result<Vec<usize>, ModelError> {
    extract_params(config).map(|(_, sizes)| sizes)
}

/// Scatter a flat caller-supplied vector back into the path-addressed
/// leaves, in declaration order.
///
/// The vector length must equal the sum of the parameter sizes.
pub fn apply_params(config: &mut Config, input: &[f64]) -> Result<(), ModelError> {
    let mut root = to_value(&*config)?;
    let paths = config.meta.params.clone();
    let mut offset = 0usize;
    for path in &paths {
        let leaf = resolve_mut(&mut root, path)?;
        let len = match leaf {
            Value::Array(items) => items.len(),
            Value::Number(_) => 1,
            other => {
                return Err(ModelError::Configuration(format!(
                    "parameter path \"{path}\" addresses a non-numeric leaf ({other})"
                )))
            }
        };
        let slice = input.get(offset..offset + len).ok_or_else(|| {
            ModelError::Configuration(format!(
                "input vector has {} entries, parameter paths require more",
                input.len()
            ))
        })?;
        if let Value::Array(items) = leaf {
            for (item, v) in items.iter_mut().zip(slice) {
                *item = Value::Number(finite_number(*v, path)?);
            }
        } else {
            *leaf = Value::Number(finite_number(slice[0], path)?);
        }
        offset += len;
    }
    if offset != input.len() {
        return Err(ModelError::Configuration(format!(
            "input vector has {} entries, parameter paths require {offset}",
            input.len()
        )));
    }
    *config = serde_json::from_value(root)
        .map_err(|e| ModelError::Configuration(format!("rebuilding configuration: {e}")))?;
    Ok(())
}

fn to_value<T: serde::Serialize>(v: &T) -> Result<Value, ModelError> {
    serde_json::to_value(v)
        .map_err(|e| ModelError::Configuration(format!("serializing configuration: {e}")))
}

fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, ModelError> {
    let mut node = root;
    for key in path.split('.') {
        node = node
            .as_object()
            .and_then(|map| map.get(key))
            .ok_or_else(|| missing_key(path, key))?;
    }
    Ok(node)
}

fn resolve_mut<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Value, ModelError> {
    let mut node = root;
    for key in path.split('.') {
        node = match node.as_object_mut().and_then(|map| map.get_mut(key)) {
            Some(next) => next,
            None => return Err(missing_key(path, key)),
        };
    }
    Ok(node)
}

fn missing_key(path: &str, key: &str) -> ModelError {
    ModelError::Configuration(format!(
        "parameter path \"{path}\" does not resolve: no key \"{key}\""
    ))
}

fn numeric_leaf(leaf: &Value, path: &str) -> Result<Vec<f64>, ModelError> {
    match leaf {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| {
                    ModelError::Configuration(format!(
                        "parameter path \"{path}\" contains a non-numeric entry ({item})"
                    ))
                })
            })
            .collect(),
        Value::Number(n) => n.as_f64().map(|v| vec![v]).ok_or_else(|| {
            ModelError::Configuration(format!("parameter path \"{path}\" is not representable"))
        }),
        other => Err(ModelError::Configuration(format!(
            "parameter path \"{path}\" addresses a non-numeric leaf ({other})"
        ))),
    }
}

fn finite_number(v: f64, path: &str) -> Result<serde_json::Number, ModelError> {
    serde_json::Number::from_f64(v).ok_or_else(|| {
        ModelError::Configuration(format!(
            "parameter path \"{path}\" received a non-finite value"
        ))
    })
}
