//! Mutator lifecycle hosting.
//!
//! A [`HostedMutator`] owns the mutator implementation together with its
//! descriptor and the binding of the mutation currently injected. The
//! [`MutatorRegistry`] keeps hosted mutators by id, tracks which mutations
//! are active on each, and routes inject/clear/reset commands.

use crate::binding::{BoundParams, ParamBinding};
use crate::descriptor::MutatorDescriptor;
use crate::error::DescriptorError;
use modality_types::{MutationId, MutatorId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Behavior supplied by a mutator implementation.
pub trait Mutator {
    /// Applies a mutation. Returns whether the injection succeeded.
    fn inject(&mut self, mutation_id: MutationId, params: &BoundParams<'_>) -> bool;

    /// Stops applying a single mutation.
    fn clear_mutation(&mut self, mutation_id: &MutationId);

    /// Returns the mutator to its unmutated state.
    fn reset(&mut self);
}

impl<M: Mutator + ?Sized> Mutator for Box<M> {
    fn inject(&mut self, mutation_id: MutationId, params: &BoundParams<'_>) -> bool {
        (**self).inject(mutation_id, params)
    }

    fn clear_mutation(&mut self, mutation_id: &MutationId) {
        (**self).clear_mutation(mutation_id)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// A mutator together with its identity, description and current binding.
pub struct HostedMutator<M> {
    id: MutatorId,
    descriptor: MutatorDescriptor,
    binding: Option<ParamBinding>,
    mutator: M,
}

impl<M: Mutator> HostedMutator<M> {
    pub fn new(descriptor: MutatorDescriptor, mutator: M) -> Self {
        Self::with_id(MutatorId::allocate(), descriptor, mutator)
    }

    pub fn with_id(id: MutatorId, descriptor: MutatorDescriptor, mutator: M) -> Self {
        Self {
            id,
            descriptor,
            binding: None,
            mutator,
        }
    }

    pub fn id(&self) -> MutatorId {
        self.id
    }

    pub fn descriptor(&self) -> &MutatorDescriptor {
        &self.descriptor
    }

    pub fn binding(&self) -> Option<&ParamBinding> {
        self.binding.as_ref()
    }

    /// Parameters as the mutator currently sees them.
    pub fn params(&self) -> BoundParams<'_> {
        BoundParams::new(self.descriptor.params(), self.binding.as_ref())
    }

    pub fn inner(&self) -> &M {
        &self.mutator
    }

    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.mutator
    }

    /// Binds `binding` and hands the mutation to the mutator.
    pub fn inject(&mut self, mutation_id: MutationId, binding: ParamBinding) -> bool {
        let binding = self.binding.insert(binding);
        let params = BoundParams::new(self.descriptor.params(), Some(&*binding));
        let success = self.mutator.inject(mutation_id, &params);
        if !success {
            warn!(mutator_id = %self.id, mutation_id = %mutation_id, "Mutator rejected mutation");
        }
        success
    }

    /// The binding stays attached; parameters keep their injected values.
    pub fn clear_mutation(&mut self, mutation_id: &MutationId) {
        self.mutator.clear_mutation(mutation_id);
    }

    /// Detaches the binding, then resets the mutator.
    pub fn reset(&mut self) {
        self.binding = None;
        self.mutator.reset();
    }
}

type DynHosted = HostedMutator<Box<dyn Mutator + Send>>;

/// Hosted mutators by id, with the set of active mutations for each.
#[derive(Default)]
pub struct MutatorRegistry {
    mutators: HashMap<MutatorId, DynHosted>,
    active_mutations: HashMap<MutatorId, HashSet<MutationId>>,
}

impl MutatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ================================================================
    // Registration
    // ================================================================

    /// Hosts a mutator under a freshly allocated id.
    pub fn register<M>(&mut self, descriptor: MutatorDescriptor, mutator: M) -> MutatorId
    where
        M: Mutator + Send + 'static,
    {
        let boxed: Box<dyn Mutator + Send> = Box::new(mutator);
        let hosted = HostedMutator::new(descriptor, boxed);
        let id = hosted.id();
        info!(
            mutator_id = %id,
            name = hosted.descriptor().metadata().name.as_deref().unwrap_or("<unnamed>"),
            "Mutator registered"
        );
        self.mutators.insert(id, hosted);
        id
    }

    /// Removes a mutator, clearing its active mutations and resetting it
    /// first.
    pub fn unregister(&mut self, mutator_id: MutatorId) -> Result<(), DescriptorError> {
        self.clear_mutations_for_mutator(mutator_id, true)?;
        self.mutators.remove(&mutator_id);
        info!(mutator_id = %mutator_id, "Mutator unregistered");
        Ok(())
    }

    pub fn get(&self, mutator_id: MutatorId) -> Option<&DynHosted> {
        self.mutators.get(&mutator_id)
    }

    pub fn descriptor(&self, mutator_id: MutatorId) -> Option<&MutatorDescriptor> {
        self.get(mutator_id).map(HostedMutator::descriptor)
    }

    pub fn ids(&self) -> impl Iterator<Item = MutatorId> + '_ {
        self.mutators.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }

    // ================================================================
    // Lifecycle routing
    // ================================================================

    /// Injects a mutation. The mutation is tracked as active even when the
    /// mutator reports failure, so a later clear still reaches it.
    pub fn inject(
        &mut self,
        mutator_id: MutatorId,
        mutation_id: MutationId,
        binding: ParamBinding,
    ) -> Result<bool, DescriptorError> {
        let hosted = self
            .mutators
            .get_mut(&mutator_id)
            .ok_or(DescriptorError::UnknownMutator(mutator_id))?;

        let success = hosted.inject(mutation_id, binding);
        self.active_mutations
            .entry(mutator_id)
            .or_default()
            .insert(mutation_id);
        debug!(mutator_id = %mutator_id, mutation_id = %mutation_id, success, "Mutation injected");
        Ok(success)
    }

    /// Clears one mutation. Clearing a mutation that is not active is a
    /// logged no-op.
    pub fn clear_mutation(
        &mut self,
        mutator_id: MutatorId,
        mutation_id: MutationId,
        reset_if_active: bool,
    ) -> Result<(), DescriptorError> {
        let hosted = self
            .mutators
            .get_mut(&mutator_id)
            .ok_or(DescriptorError::UnknownMutator(mutator_id))?;

        let was_active = self
            .active_mutations
            .get_mut(&mutator_id)
            .is_some_and(|set| set.remove(&mutation_id));
        if !was_active {
            warn!(
                mutator_id = %mutator_id,
                mutation_id = %mutation_id,
                "Cannot clear mutation, not active"
            );
            return Ok(());
        }
        if self
            .active_mutations
            .get(&mutator_id)
            .is_some_and(HashSet::is_empty)
        {
            self.active_mutations.remove(&mutator_id);
        }

        debug!(mutator_id = %mutator_id, mutation_id = %mutation_id, "Clearing mutation");
        hosted.clear_mutation(&mutation_id);
        if reset_if_active {
            hosted.reset();
        }
        Ok(())
    }

    /// Clears every active mutation of one mutator.
    pub fn clear_mutations_for_mutator(
        &mut self,
        mutator_id: MutatorId,
        reset_if_active: bool,
    ) -> Result<(), DescriptorError> {
        let hosted = self
            .mutators
            .get_mut(&mutator_id)
            .ok_or(DescriptorError::UnknownMutator(mutator_id))?;

        let Some(active) = self.active_mutations.remove(&mutator_id) else {
            debug!(mutator_id = %mutator_id, "No active mutations to clear");
            return Ok(());
        };
        for mutation_id in active {
            debug!(mutator_id = %mutator_id, mutation_id = %mutation_id, "Clearing mutation");
            hosted.clear_mutation(&mutation_id);
        }
        if reset_if_active {
            hosted.reset();
        }
        Ok(())
    }

    /// Clears every active mutation and resets each affected mutator.
    pub fn clear_all(&mut self) {
        for (mutator_id, active) in self.active_mutations.drain() {
            let Some(hosted) = self.mutators.get_mut(&mutator_id) else {
                warn!(
                    mutator_id = %mutator_id,
                    "Active mutations recorded for unregistered mutator"
                );
                continue;
            };
            for mutation_id in active {
                hosted.clear_mutation(&mutation_id);
            }
            hosted.reset();
        }
    }

    /// Resets a mutator, forgetting its active mutations.
    pub fn reset(&mut self, mutator_id: MutatorId) -> Result<(), DescriptorError> {
        let hosted = self
            .mutators
            .get_mut(&mutator_id)
            .ok_or(DescriptorError::UnknownMutator(mutator_id))?;
        self.active_mutations.remove(&mutator_id);
        hosted.reset();
        Ok(())
    }

    pub fn is_active(&self, mutator_id: MutatorId, mutation_id: MutationId) -> bool {
        self.active_mutations
            .get(&mutator_id)
            .is_some_and(|set| set.contains(&mutation_id))
    }

    pub fn active_mutations(&self, mutator_id: MutatorId) -> Vec<MutationId> {
        let mut ids: Vec<_> = self
            .active_mutations
            .get(&mutator_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}
