//! # Cube Combination
//!
//! Joins several cubes over the axes they have in common. Every input point
//! is projected onto the output axes and re-added, so points that collapse
//! onto the same reduced key are merged with the value's addition operator.
//! Errors are projected the same way, dropping any key on an axis the output
//! does not carry.
//!
//! Inputs are only read; the output is a fresh cube.

use crate::cube::NamedKeys;
use crate::{Axis, AxisSet, AxisValue, Cube, CubeError, CubeValue};

/// Axes present, structurally equal, in every input cube.
///
/// Ordered as in the first cube's schema. Empty when there are no inputs.
pub fn common_axes<'a, V, I>(cubes: I) -> Vec<Axis>
where
    V: CubeValue + 'a,
    I: IntoIterator<Item = &'a Cube<V>>,
{
    intersect(cubes.into_iter().map(Cube::axis_set))
}

/// Whether the cubes share at least one axis.
pub fn can_combine_cubes<'a, V, I>(cubes: I) -> bool
where
    V: CubeValue + 'a,
    I: IntoIterator<Item = &'a Cube<V>>,
{
    !common_axes(cubes).is_empty()
}

pub(crate) fn intersect<'a>(schemas: impl IntoIterator<Item = &'a AxisSet>) -> Vec<Axis> {
    let mut schemas = schemas.into_iter();
    let Some(first) = schemas.next() else {
        return Vec::new();
    };

    let mut common: Vec<Axis> = first.iter().cloned().collect();
    for schema in schemas {
        common.retain(|axis| schema.contains(axis));
    }
    common
}

/// Combine cubes into a new cube over their common axes.
///
/// With `axis_names`, the output schema is exactly those axes in that order;
/// every name must be a common axis. Without it, the output carries every
/// common axis in the first cube's order.
///
/// # Errors
/// - `IncompatibleSchema` if there are no inputs or they share no axis
/// - `Schema` if `axis_names` names an axis that is not common to all
///   inputs, or names one twice
/// - `TypeMismatch` if the inputs hold values of different kinds
pub fn combine_cubes<'a, V, I>(cubes: I, axis_names: Option<&[&str]>) -> Result<Cube<V>, CubeError>
where
    V: CubeValue + 'a,
    I: IntoIterator<Item = &'a Cube<V>>,
{
    let cubes: Vec<&Cube<V>> = cubes.into_iter().collect();
    let common = common_axes(cubes.iter().copied());
    if common.is_empty() {
        return Err(CubeError::IncompatibleSchema(format!(
            "Unable to combine {} cubes - zero common axes",
            cubes.len()
        )));
    }

    let output_axes = match axis_names {
        None => common,
        Some(names) => {
            let selected = names
                .iter()
                .map(|name| {
                    common
                        .iter()
                        .find(|axis| axis.name() == *name)
                        .cloned()
                        .ok_or_else(|| {
                            CubeError::Schema(format!("No axis '{}' found on input cubes", name))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if selected.len() < common.len() {
                tracing::warn!(
                    "Combining on {} of {} common axes, the rest are summed away",
                    selected.len(),
                    common.len()
                );
            }
            selected
        }
    };

    let mut output = Cube::new(AxisSet::new(output_axes)?)?;
    tracing::info!(
        "Combining {} cubes over axes {:?}",
        cubes.len(),
        output.axis_set().names().collect::<Vec<_>>()
    );

    for cube in &cubes {
        add_projected(&mut output, cube)?;
    }

    tracing::info!("Combined cube holds {} points", output.len());
    Ok(output)
}

/// Re-add one cube's points and errors into `output`, keyed by output axes.
fn add_projected<V: CubeValue>(output: &mut Cube<V>, cube: &Cube<V>) -> Result<(), CubeError> {
    let local = cube.axis_set();
    let indices = output
        .axis_set()
        .names()
        .map(|name| {
            local.index_of(name).ok_or_else(|| {
                CubeError::InvalidState(format!("Common axis '{}' missing from input cube", name))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for point in cube.iter() {
        let keys = indices
            .iter()
            .map(|&idx| point.axis_value(idx).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        output.add_item(&keys, point.value())?;
    }

    // Each error once per input cube.
    let errors: Vec<(NamedKeys, String)> = cube
        .error_set()
        .iter()
        .map(|error| -> Result<(NamedKeys, String), CubeError> {
            let keys = error
                .error_axes()
                .into_iter()
                .filter(|name| output.axis_set().index_of(name).is_some())
                .map(|name| -> Result<(String, AxisValue), CubeError> {
                    Ok((name.to_string(), error.error_key(name)?.clone()))
                })
                .collect::<Result<NamedKeys, _>>()?;
            Ok((keys, error.message().to_string()))
        })
        .collect::<Result<_, _>>()?;

    for (keys, message) in errors {
        output.add_error(&keys, message)?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
