/// Economy Kernel v1: Resource Catalog
///
/// Resource kinds and their recipes. Immutable after creation.

use std::collections::BTreeSet;

use crate::arithmetic::validate_name;
use crate::config::EconomyConfig;
use crate::domain::{EconomyState, RecipeInput, Resource, ResourceId, Storage};
use crate::error::{EngineError, EngineResult};

/// Register a resource kind. Recipe inputs must already exist.
pub fn create_resource(
    state: &mut EconomyState,
    config: &EconomyConfig,
    name: &str,
    recipe: &[RecipeInput],
) -> EngineResult<ResourceId> {
    validate_name(name, config.max_name_length)?;

    if recipe.len() > config.max_recipe_inputs {
        return Err(EngineError::ResourceInputMax {
            max: config.max_recipe_inputs,
        });
    }

    let mut seen: BTreeSet<ResourceId> = BTreeSet::new();
    for line in recipe {
        if line.amount <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "recipe amount for {} must be positive, got {}",
                line.resource_id, line.amount
            )));
        }
        if !seen.insert(line.resource_id) {
            return Err(EngineError::InvalidInput(format!(
                "{} listed twice in recipe",
                line.resource_id
            )));
        }
        state.resource(line.resource_id)?;
    }

    let id = ResourceId(state.allocate_id()?);
    state.put_resource(Resource {
        id,
        name: name.to_string(),
        recipe: recipe.to_vec(),
    });
    Ok(id)
}

/// Match input storages against a recipe.
///
/// Returns the required amount per output unit for each storage, in the
/// order the storages were given. The storages must cover the recipe
/// exactly: same arity, one storage per recipe line.
pub fn match_recipe(resource: &Resource, inputs: &[&Storage]) -> EngineResult<Vec<i64>> {
    if resource.recipe.len() != inputs.len() {
        return Err(EngineError::InputStorageNotSupplied(format!(
            "{} requires {} inputs, {} supplied",
            resource.id,
            resource.recipe.len(),
            inputs.len()
        )));
    }

    let mut covered: BTreeSet<ResourceId> = BTreeSet::new();
    let mut required = Vec::with_capacity(inputs.len());
    for storage in inputs {
        let amount = resource.required_amount(storage.resource_id).ok_or_else(|| {
            EngineError::InputStorageNotSupplied(format!(
                "{} holds {}, which is not an input of {}",
                storage.id, storage.resource_id, resource.id
            ))
        })?;
        if !covered.insert(storage.resource_id) {
            return Err(EngineError::InputStorageNotSupplied(format!(
                "{} supplied twice for {}",
                storage.resource_id, resource.id
            )));
        }
        required.push(amount);
    }
    Ok(required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LocationId, Mobility, StorageId};
    use crate::state::create_initial_state;

    fn storage(id: u64, resource_id: ResourceId) -> Storage {
        Storage {
            id: StorageId(id),
            resource_id,
            amount: 0,
            capacity: 10,
            location_id: LocationId(1),
            mobility: Mobility::Fixed,
            speed: 0,
            arrives_at: 0,
        }
    }

    #[test]
    fn recipe_inputs_must_exist() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let err = create_resource(
            &mut state,
            &config,
            "plank",
            &[RecipeInput { resource_id: ResourceId(42), amount: 1 }],
        )
        .unwrap_err();
        assert_eq!(err, EngineError::RecordNotFound { kind: "resource", id: 42 });
        assert!(state.resources.is_empty());
    }

    #[test]
    fn too_many_inputs_rejected() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let a = create_resource(&mut state, &config, "a", &[]).unwrap();
        let b = create_resource(&mut state, &config, "b", &[]).unwrap();
        let c = create_resource(&mut state, &config, "c", &[]).unwrap();
        let recipe: Vec<RecipeInput> = [a, b, c]
            .iter()
            .map(|&resource_id| RecipeInput { resource_id, amount: 1 })
            .collect();
        assert_eq!(
            create_resource(&mut state, &config, "d", &recipe),
            Err(EngineError::ResourceInputMax { max: 2 })
        );
    }

    #[test]
    fn duplicate_and_non_positive_lines_rejected() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let a = create_resource(&mut state, &config, "a", &[]).unwrap();
        let dup = [
            RecipeInput { resource_id: a, amount: 1 },
            RecipeInput { resource_id: a, amount: 2 },
        ];
        assert!(matches!(
            create_resource(&mut state, &config, "x", &dup),
            Err(EngineError::InvalidInput(_))
        ));
        let zero = [RecipeInput { resource_id: a, amount: 0 }];
        assert!(matches!(
            create_resource(&mut state, &config, "y", &zero),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn match_recipe_returns_amounts_in_storage_order() {
        let mut state = create_initial_state();
        let config = EconomyConfig::default();
        let a = create_resource(&mut state, &config, "a", &[]).unwrap();
        let b = create_resource(&mut state, &config, "b", &[]).unwrap();
        let c = create_resource(
            &mut state,
            &config,
            "c",
            &[
                RecipeInput { resource_id: a, amount: 3 },
                RecipeInput { resource_id: b, amount: 1 },
            ],
        )
        .unwrap();
        let resource = state.resource(c).unwrap();
        let sa = storage(10, a);
        let sb = storage(11, b);
        assert_eq!(match_recipe(resource, &[&sb, &sa]), Ok(vec![1, 3]));
        assert!(matches!(
            match_recipe(resource, &[&sa, &sa]),
            Err(EngineError::InputStorageNotSupplied(_))
        ));
        assert!(matches!(
            match_recipe(resource, &[&sa]),
            Err(EngineError::InputStorageNotSupplied(_))
        ));
    }
}
