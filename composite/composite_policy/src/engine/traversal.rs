//! Visibility traversal.
//!
//! Starting from the client's composite, the walk first tries to import the
//! provider from the parent and then tries each child that exports it. A
//! hop is only taken when the composite on the near side has a policy
//! covering the provider. Once an import entry with a peer constraint has
//! been matched, the walk is committed to that peer and may not climb
//! further.

use tracing::trace;

use crate::engine::node::{CompositeInfo, NodeLookup};
use crate::model::{MatchedPolicy, Provider};

impl CompositeInfo {
    /// Check whether `provider`, living in `provider_composite`, is visible
    /// from this composite.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Resolves parent and child ids.
    /// * `provider` - The provider being looked for.
    /// * `origin` - The composite the walk arrived from; it is not revisited.
    ///   Pass this composite's own node to start a walk.
    /// * `peer_policy` - The policy the previous hop committed to, if any.
    /// * `provider_composite` - The composite the provider lives in.
    ///
    /// # Returns
    ///
    /// `true` if some path of matching policies connects the two composites.
    pub fn visible<L: NodeLookup + ?Sized>(
        &self,
        lookup: &L,
        provider: &Provider<'_>,
        origin: &CompositeInfo,
        peer_policy: Option<&MatchedPolicy>,
        provider_composite: &CompositeInfo,
    ) -> bool {
        let committed = peer_policy.map_or(false, MatchedPolicy::has_peer_constraint);

        if let Some(parent_id) = self.parent_id() {
            if origin.id() != parent_id && !committed {
                if let Some(parent) = lookup.node(parent_id) {
                    if self.visible_through_parent(lookup, provider, &parent, provider_composite) {
                        return true;
                    }
                }
            }
        }

        for child_id in self.children() {
            if child_id == origin.id() {
                continue;
            }
            let child = match lookup.node(child_id) {
                Some(child) => child,
                None => continue,
            };
            if child.match_export(provider, peer_policy).is_none() {
                continue;
            }
            if child.id() == provider_composite.id() {
                trace!(composite = %self.id(), child = %child_id, "Provider exported by child");
                return true;
            }
            if child.visible(lookup, provider, self, None, provider_composite) {
                return true;
            }
        }

        false
    }

    fn visible_through_parent<L: NodeLookup + ?Sized>(
        &self,
        lookup: &L,
        provider: &Provider<'_>,
        parent: &CompositeInfo,
        provider_composite: &CompositeInfo,
    ) -> bool {
        let matched = match self.match_import(provider) {
            Some(matched) => matched,
            None => return false,
        };

        if parent.id() == provider_composite.id() {
            let parent_descriptor = parent.descriptor();
            let satisfied = !matched.has_peer_constraint()
                || matched.peer_satisfied_by(&parent_descriptor.identity(parent.id()));
            trace!(composite = %self.id(), parent = %parent.id(), satisfied, "Provider in parent");
            // The provider lives in the parent itself, so recursing cannot find it
            return satisfied;
        }

        parent.visible(lookup, provider, self, Some(&matched), provider_composite)
    }
}
